//! Proposal, plan and SQL generation tests over in-memory ranges

use pretty_assertions::assert_eq;
use sheet_export::excel::naming::{table_name_copy, worksheet_name_avoiding_duplicates};
use sheet_export::schema::{normalize_table_name, IssueKind, MySqlDataType};
use sheet_export::{CellGrid, CellValue, ExportPlan, ExportSettings, SqlGenerator, TableProposal};

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn proposal(sheet: &str, rows: Vec<Vec<CellValue>>) -> TableProposal {
    let grid = CellGrid::new(sheet, (0, 0), rows);
    TableProposal::from_grid(grid, &ExportSettings::default()).unwrap()
}

fn orders() -> TableProposal {
    proposal(
        "Orders",
        vec![
            vec![text("Id"), text("Customer"), text("Amount")],
            vec![CellValue::Int(1), text("Ann"), CellValue::Float(12.5)],
            vec![CellValue::Int(2), text("Bob"), CellValue::Float(7.25)],
            vec![CellValue::Int(3), text("O'Neil"), CellValue::Empty],
        ],
    )
}

fn people() -> TableProposal {
    proposal(
        "People",
        vec![
            vec![text("Code"), text("Name")],
            vec![text("A1"), text("Ann")],
            vec![text("B2"), text("Bob")],
        ],
    )
}

fn numbered(sheet: &str, rows: usize) -> TableProposal {
    let mut cells = vec![vec![text("Label"), text("Value")]];
    for i in 0..rows {
        cells.push(vec![text(&format!("row {}", i)), CellValue::Int(i as i64)]);
    }
    proposal(sheet, cells)
}

// ═══════════════════════════════════════════════════════════════════════════
// DEFAULT PROPOSAL
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_integer_first_column_becomes_key() {
    for ids in [vec![1, 2, 3], vec![-5, 0, 1_000_000], vec![7, 7, 8]] {
        let mut rows = vec![vec![text("Id"), text("Name")]];
        rows.extend(ids.iter().map(|i| vec![CellValue::Int(*i), text("x")]));
        let p = proposal("Items", rows);
        assert!(!p.add_primary_key(), "ids {:?}", ids);
        assert_eq!(p.primary_key_columns()[0].name, "Id");
    }
}

#[test]
fn test_whole_floats_count_as_integers() {
    let p = proposal(
        "Items",
        vec![
            vec![text("Id"), text("Name")],
            vec![CellValue::Float(1.0), text("a")],
            vec![CellValue::Float(2.0), text("b")],
        ],
    );
    assert!(!p.add_primary_key());
    assert_eq!(p.data_columns()[0].data_type, MySqlDataType::Integer);
}

#[test]
fn test_non_integer_first_column_gets_synthetic_key() {
    let cases = vec![
        vec![CellValue::Int(1), CellValue::Float(1.5)],
        vec![CellValue::Int(1), text("two")],
        vec![text("a"), text("b")],
        vec![CellValue::Empty, CellValue::Empty],
        vec![CellValue::Int(1), CellValue::Empty, CellValue::Int(3)],
    ];
    for values in cases {
        let mut rows = vec![vec![text("Key"), text("Name")]];
        rows.extend(values.iter().map(|v| vec![v.clone(), text("x")]));
        let p = proposal("Items", rows);
        assert!(p.add_primary_key(), "values {:?}", values);
        assert_eq!(p.synthetic_key().name, "items_id");
        assert!(p.data_columns().iter().all(|c| !c.primary_key));
        assert!(p.is_exportable(), "values {:?}: {:?}", values, p.validate());
    }
}

#[test]
fn test_table_name_normalization_is_idempotent() {
    for name in ["Customer Orders", "SALES 2024", "already_normal", "  Mixed Case  ", ""] {
        let once = normalize_table_name(name);
        assert_eq!(normalize_table_name(&once), once);
    }
    assert_eq!(normalize_table_name("Customer Orders"), "customer_orders");
}

// ═══════════════════════════════════════════════════════════════════════════
// GENERATED SQL
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_copy_sql() {
    let p = orders();
    let sql = SqlGenerator::new(&p).with_schema(Some("sales")).copy_sql();
    assert_eq!(
        sql,
        "CREATE TABLE `sales`.`orders`\n(\n  \
         `Id` INTEGER NOT NULL,\n  \
         `Customer` VARCHAR(12) NULL,\n  \
         `Amount` DECIMAL(12, 2) NULL,\n  \
         PRIMARY KEY (`Id`)\n);\n\
         INSERT INTO `sales`.`orders` (`Id`, `Customer`, `Amount`) VALUES \
         (1, 'Ann', 12.5),\n(2, 'Bob', 7.25),\n(3, 'O\\'Neil', NULL);"
    );
}

#[test]
fn test_rename_changes_one_identifier() {
    let before = orders();
    let mut after = orders();
    after.rename_column(1, "client").unwrap();

    let old_sql = SqlGenerator::new(&before).copy_sql();
    let new_sql = SqlGenerator::new(&after).copy_sql();
    assert_ne!(old_sql, new_sql);
    assert_eq!(new_sql.replace("`client`", "`Customer`"), old_sql);

    let old_create = SqlGenerator::new(&before).create_table();
    let new_create = SqlGenerator::new(&after).create_table();
    let changed = old_create
        .lines()
        .zip(new_create.lines())
        .filter(|(a, b)| a != b)
        .count();
    assert_eq!(changed, 1);
}

#[test]
fn test_excluded_column_in_neither_statement() {
    let mut p = orders();
    p.set_exclude(1, true).unwrap();
    let generator = SqlGenerator::new(&p);

    assert!(!generator.create_table().contains("Customer"));
    for statement in generator.insert_statements() {
        assert!(!statement.contains("Customer"));
        assert!(!statement.contains("Ann"));
    }
    assert_eq!(generator.row_values()[0].len(), 2);
}

#[test]
fn test_synthetic_key_not_inserted() {
    let p = people();
    assert!(p.add_primary_key());
    let generator = SqlGenerator::new(&p);

    let create = generator.create_table();
    assert!(create.contains("`people_id` INTEGER NOT NULL AUTO_INCREMENT"));
    assert!(create.contains("PRIMARY KEY (`people_id`)"));
    for statement in generator.insert_statements() {
        assert!(statement.starts_with("INSERT INTO `people` (`Code`, `Name`) VALUES "));
        assert!(!statement.contains("people_id"));
    }
    for batch in generator.insert_batches() {
        assert!(!batch.sql.contains("people_id"));
    }
}

#[test]
fn test_insert_batching() {
    for (rows, per_insert, expected) in [(250, 100, 3), (200, 100, 2), (1, 100, 1), (7, 3, 3)] {
        let p = numbered("Numbers", rows);
        let generator = SqlGenerator::new(&p).with_rows_per_insert(per_insert);

        let statements = generator.insert_statements();
        let batches = generator.insert_batches();
        assert_eq!(statements.len(), expected);
        assert_eq!(batches.len(), expected);
        assert!(batches.iter().all(|b| b.rows <= per_insert));
        assert_eq!(batches.iter().map(|b| b.rows).sum::<usize>(), rows);
        for batch in &batches {
            assert_eq!(batch.params.len(), batch.rows * 2);
            assert_eq!(batch.sql.matches('?').count(), batch.params.len());
        }
    }
}

#[test]
fn test_composite_key_and_indexes() {
    let mut p = orders();
    p.use_existing_keys(&["Id", "Customer"]).unwrap();
    p.set_unique(2, true).unwrap();
    p.set_create_index(0, true).unwrap();

    let create = SqlGenerator::new(&p).create_table();
    assert!(create.contains("PRIMARY KEY (`Id`, `Customer`)"));
    assert!(create.contains("`Customer` VARCHAR(12) NOT NULL"));
    assert!(create.contains("UNIQUE INDEX `Amount_UNIQUE` (`Amount` ASC)"));
    assert!(create.contains("INDEX `Id_IDX` (`Id` ASC)"));
}

// ═══════════════════════════════════════════════════════════════════════════
// VALIDATION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_duplicate_values_in_unique_column_block_export() {
    let mut p = proposal(
        "Tags",
        vec![
            vec![text("Tag"), text("Color")],
            vec![text("a"), text("red")],
            vec![text("b"), text("red")],
        ],
    );
    assert!(p.is_exportable());

    p.set_unique(1, true).unwrap();
    assert!(!p.is_exportable());
    assert!(p
        .column_issues(1)
        .iter()
        .any(|i| i.kind == IssueKind::DataNotUnique));

    p.set_unique(1, false).unwrap();
    assert!(p.is_exportable());
}

#[test]
fn test_discouraged_names_do_not_block() {
    let mut p = orders();
    p.set_table_name("Customer Orders");
    assert_eq!(p.name(), "customer_orders");

    let issues = p.validate();
    assert!(issues.iter().any(|i| i.kind == IssueKind::DiscouragedName));
    assert!(issues.iter().all(|i| !i.blocking));
}

// ═══════════════════════════════════════════════════════════════════════════
// NAMING
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_copy_names() {
    let existing = ["Orders", "Copy 1 of Orders", "Copy 2 of Orders"];
    assert_eq!(worksheet_name_avoiding_duplicates(&existing, "Orders"), "Copy 3 of Orders");
    assert_eq!(table_name_copy("orders", 2), "orders_2");
    assert_eq!(table_name_copy("orders", 3), "orders_3");
}

// ═══════════════════════════════════════════════════════════════════════════
// EXPORT PLANS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_plan_round_trip() {
    let mut edited = orders();
    edited.set_table_name("Order Lines");
    edited.rename_column(1, "customer").unwrap();
    edited.set_data_type(1, MySqlDataType::Varchar(45)).unwrap();
    edited.use_synthetic_key();
    edited.set_synthetic_key_name("line_id");
    edited.set_exclude(0, true).unwrap();

    let plan = ExportPlan::from_proposal(&edited);
    let parsed = ExportPlan::parse(&plan.to_yaml().unwrap()).unwrap();
    assert_eq!(parsed, plan);

    let mut fresh = orders();
    parsed.apply(&mut fresh).unwrap();
    assert_eq!(ExportPlan::from_proposal(&fresh), plan);
    assert_eq!(
        SqlGenerator::new(&fresh).copy_sql(),
        SqlGenerator::new(&edited).copy_sql()
    );
}

#[test]
fn test_hand_written_json_plan() {
    let plan = ExportPlan::parse(
        r#"{
            "table_name": "orders_2024",
            "primary_key": { "columns": ["Id", "client"] },
            "columns": [
                { "source": 1, "name": "client" },
                { "source": 2, "exclude": true }
            ]
        }"#,
    )
    .unwrap();

    let mut p = orders();
    plan.apply(&mut p).unwrap();

    let create = SqlGenerator::new(&p).create_table();
    assert!(create.starts_with("CREATE TABLE `orders_2024`"));
    assert!(create.contains("PRIMARY KEY (`Id`, `client`)"));
    assert!(!create.contains("Amount"));
}

#[test]
fn test_plan_with_unknown_key_column_fails() {
    let plan = ExportPlan::parse("primary_key:\n  columns: [Nope]\n").unwrap();
    let mut p = orders();
    assert!(plan.apply(&mut p).is_err());
}
