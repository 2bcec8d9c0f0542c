use crate::schema::data_type::MySqlDataType;

/// A proposed column of the new table.
///
/// `source` is the column's index in the exported range; the synthetic key
/// column has no source.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProposal {
    pub name: String,
    pub data_type: MySqlDataType,
    pub allow_null: bool,
    pub unique: bool,
    pub create_index: bool,
    pub primary_key: bool,
    pub exclude: bool,
    pub auto_increment: bool,
    pub source: Option<usize>,
}

impl ColumnProposal {
    pub fn new(name: impl Into<String>, data_type: MySqlDataType, source: usize) -> Self {
        Self {
            name: name.into(),
            data_type,
            allow_null: false,
            unique: false,
            create_index: false,
            primary_key: false,
            exclude: false,
            auto_increment: false,
            source: Some(source),
        }
    }

    /// The added `INTEGER AUTO_INCREMENT` key column
    pub fn synthetic_key(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: MySqlDataType::Integer,
            allow_null: false,
            unique: false,
            create_index: false,
            primary_key: true,
            exclude: false,
            auto_increment: true,
            source: None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.source.is_none()
    }
}

/// Names with spaces or upper-case letters work but are discouraged in MySQL
pub fn has_discouraged_characters(name: &str) -> bool {
    name.contains(' ') || name.chars().any(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_key() {
        let key = ColumnProposal::synthetic_key("orders_id");
        assert!(key.is_synthetic());
        assert!(key.primary_key && key.auto_increment);
        assert_eq!(key.data_type, MySqlDataType::Integer);
        assert!(!ColumnProposal::new("a", MySqlDataType::Integer, 0).is_synthetic());
    }

    #[test]
    fn test_discouraged_characters() {
        assert!(has_discouraged_characters("First Name"));
        assert!(has_discouraged_characters("firstName"));
        assert!(!has_discouraged_characters("first_name"));
    }
}
