#[cfg(test)]
mod tests {
    use borm::{AsValue, Dialect, Field, Model, MySqlDialect, RowLabeled, Schema, SqliteDialect, Value};
    use std::sync::Arc;
    use time::{PrimitiveDateTime, macros::datetime};
    use uuid::Uuid;

    #[allow(non_snake_case)]
    #[derive(Model, Debug, Clone, PartialEq)]
    struct User {
        pub Name: String,
        pub Age: i32,
    }

    #[allow(dead_code)]
    #[derive(Model, Debug, Clone, PartialEq)]
    #[borm(name = "accounts")]
    struct Account {
        #[borm(tag = "PRIMARY KEY")]
        pub id: i64,
        pub email: String,
        pub balance: f64,
        pub verified: bool,
        pub avatar: Option<Vec<u8>>,
        pub created: PrimitiveDateTime,
        #[borm(skip)]
        pub session_token: String,
        cached_score: u32,
    }

    #[derive(Model, Debug, PartialEq)]
    struct r#Type {
        pub r#type: u8,
        pub big: u64,
    }

    #[test]
    fn user_schema() {
        let schema = Schema::parse::<User>(&SqliteDialect);
        assert_eq!(schema.name, "User");
        assert_eq!(
            schema.fields,
            [
                Field::new("Name", "text", ""),
                Field::new("Age", "integer", ""),
            ]
        );
        assert_eq!(schema.field_names, ["Name", "Age"]);
        assert_eq!(
            schema.get_field("Age").map(|v| v.ty.as_str()),
            Some("integer")
        );
        assert!(schema.get_field("Missing").is_none());
        assert!(schema.is::<User>());
        assert!(!schema.is::<Account>());
    }

    #[test]
    fn schema_is_deterministic() {
        let first = Schema::parse::<Account>(&SqliteDialect);
        let second = Schema::parse::<Account>(&SqliteDialect);
        assert_eq!(first.fields, second.fields);
        assert_eq!(first.field_names, second.field_names);
    }

    #[test]
    fn account_schema() {
        let schema = Schema::parse::<Account>(&SqliteDialect);
        assert_eq!(schema.name, "accounts");
        assert_eq!(
            schema.field_names,
            ["id", "email", "balance", "verified", "avatar", "created"]
        );
        assert_eq!(schema.fields[0], Field::new("id", "bigint", "PRIMARY KEY"));
        assert_eq!(schema.fields[3].ty, "bool");
        assert_eq!(schema.fields[4].ty, "blob");
        assert_eq!(schema.fields[5].ty, "datetime");

        let mysql: Arc<dyn Dialect> = Arc::new(MySqlDialect);
        let schema = Schema::parse::<User>(&*mysql);
        assert_eq!(schema.fields[1], Field::new("Age", "int", ""));
    }

    #[test]
    fn raw_identifiers() {
        assert_eq!(<r#Type as Model>::table_name(), "Type");
        let columns = <r#Type as Model>::columns();
        assert_eq!(columns[0].name, "type");
        assert_eq!(columns[0].value, u8::as_empty_value());
        assert_eq!(columns[1].value, Value::UInt64(None));
    }

    #[test]
    fn record_values() {
        let account = Account {
            id: 7,
            email: "a@b.c".into(),
            balance: 10.5,
            verified: true,
            avatar: None,
            created: datetime!(2025-01-02 03:04:05),
            session_token: "secret".into(),
            cached_score: 99,
        };
        let schema = Schema::parse::<Account>(&SqliteDialect);
        let values = schema.record_values(&account).unwrap();
        assert_eq!(
            values,
            [
                Value::Int64(Some(7)),
                Value::Varchar(Some("a@b.c".into())),
                Value::Float64(Some(10.5)),
                Value::Boolean(Some(true)),
                Value::Blob(None),
                Value::Timestamp(Some(datetime!(2025-01-02 03:04:05))),
            ]
        );
        let user = User {
            Name: "bob".into(),
            Age: 3,
        };
        assert!(schema.record_values(&user).is_err());
    }

    #[test]
    fn from_row() {
        let row = RowLabeled::new(
            [
                "created".to_string(),
                "id".into(),
                "email".into(),
                "balance".into(),
                "verified".into(),
                "avatar".into(),
                "extra".into(),
            ]
            .into(),
            Box::new([
                Value::from("2025-01-02 03:04:05"),
                Value::Int64(Some(7)),
                Value::from("a@b.c"),
                Value::Float64(Some(10.5)),
                Value::Int64(Some(1)),
                Value::Null,
                Value::Int32(Some(0)),
            ]),
        );
        let account = Account::from_row(row).unwrap();
        assert_eq!(
            account,
            Account {
                id: 7,
                email: "a@b.c".into(),
                balance: 10.5,
                verified: true,
                avatar: None,
                created: datetime!(2025-01-02 03:04:05),
                session_token: String::new(),
                cached_score: 0,
            }
        );

        let row = RowLabeled::new(["Name".to_string()].into(), Box::new([Value::from("bob")]));
        let error = User::from_row(row).unwrap_err();
        assert!(error.to_string().contains("Age"));
    }

    #[test]
    fn row_order_follows_columns() {
        #[derive(Model)]
        struct Token {
            pub id: Uuid,
            pub owner: Option<String>,
        }
        let id = Uuid::nil();
        let token = Token {
            id,
            owner: Some("alice".into()),
        };
        assert_eq!(Token::table_name(), "Token");
        assert_eq!(
            token.row().into_vec(),
            [Value::Uuid(Some(id)), Value::Varchar(Some("alice".into()))]
        );
        let names: Vec<_> = Token::columns().iter().map(|v| v.name).collect();
        assert_eq!(names, ["id", "owner"]);
        let schema = Schema::parse::<Token>(&SqliteDialect);
        assert_eq!(
            schema.fields,
            [Field::new("id", "text", ""), Field::new("owner", "text", "")]
        );
        let schema = Schema::parse::<Token>(&MySqlDialect);
        assert_eq!(schema.get_field("id").map(|v| v.ty.as_str()), Some("char(36)"));
    }
}
