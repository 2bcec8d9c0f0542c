//! Names for new worksheets and tables that avoid existing ones

/// Excel limit on worksheet name length
pub const MAX_WORKSHEET_NAME_LENGTH: usize = 31;

/// `name`, or `Copy 1 of name`, `Copy 2 of name`, ... when taken.
/// Comparison is case-insensitive, as in Excel.
pub fn worksheet_name_avoiding_duplicates<S: AsRef<str>>(existing: &[S], name: &str) -> String {
    let taken = |candidate: &str| {
        existing
            .iter()
            .any(|e| e.as_ref().eq_ignore_ascii_case(candidate))
    };
    let mut copy_index = 0;
    loop {
        let candidate = if copy_index > 0 {
            format!("Copy {} of {}", copy_index, name)
        } else {
            name.to_string()
        };
        let candidate: String = candidate.chars().take(MAX_WORKSHEET_NAME_LENGTH).collect();
        if !taken(&candidate) {
            return candidate;
        }
        copy_index += 1;
    }
}

/// Numbered variant of a table name: `name` for the first copy, `name_2`, `name_3`, ... after
pub fn table_name_copy(name: &str, copy_index: usize) -> String {
    if copy_index > 1 {
        format!("{}_{}", name, copy_index)
    } else {
        name.to_string()
    }
}
