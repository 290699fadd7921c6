//! Person record types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A row of the `pessoa` table.
///
/// Every field is optional: upserts accept partial payloads and store the
/// missing columns as NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// First name.
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    /// Surname.
    #[serde(rename = "sobrenome", default)]
    pub surname: Option<String>,
    /// CPF, the business key.
    #[serde(rename = "cpf", default)]
    pub national_id: Option<String>,
    /// Birth date, `YYYY-MM-DD`.
    #[serde(rename = "data_nascimento", default)]
    pub birth_date: Option<String>,
}

impl Person {
    /// Create a fully populated person.
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        national_id: impl Into<String>,
        birth_date: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            surname: Some(surname.into()),
            national_id: Some(national_id.into()),
            birth_date: Some(birth_date.into()),
        }
    }

    /// Build a person from a decoded JSON object.
    ///
    /// Absent or null fields become `None`. Numbers and booleans are stored
    /// as text, the way a TEXT column coerces them; arrays and objects are
    /// rejected. Unknown keys are ignored.
    pub fn from_json_object(fields: &Map<String, Value>) -> Result<Self, String> {
        Ok(Self {
            name: text_field(fields, "nome")?,
            surname: text_field(fields, "sobrenome")?,
            national_id: text_field(fields, "cpf")?,
            birth_date: text_field(fields, "data_nascimento")?,
        })
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(if *b { "1" } else { "0" }.to_string())),
        Some(Value::Array(_)) | Some(Value::Object(_)) => {
            Err(format!("field `{key}` must be a string, number, boolean or null"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_with_column_names() {
        let person = Person::new("Ana", "Silva", "12345678900", "1990-05-01");
        let json = serde_json::to_value(&person).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "nome": "Ana",
                "sobrenome": "Silva",
                "cpf": "12345678900",
                "data_nascimento": "1990-05-01"
            })
        );
    }

    #[test]
    fn missing_fields_deserialize_as_none() {
        let person: Person = serde_json::from_str(r#"{"cpf": "1"}"#).unwrap();
        assert_eq!(person.national_id.as_deref(), Some("1"));
        assert_eq!(person.name, None);
        assert_eq!(person.birth_date, None);

        // Absent fields still come back as explicit nulls.
        let json = serde_json::to_string(&person).unwrap();
        assert!(json.contains(r#""nome":null"#));
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn from_json_object_stores_scalars_as_text() {
        let fields = object(serde_json::json!({
            "nome": "Ana",
            "sobrenome": null,
            "cpf": 12345678900u64,
            "data_nascimento": true,
            "extra": [1, 2]
        }));

        let person = Person::from_json_object(&fields).unwrap();
        assert_eq!(person.name.as_deref(), Some("Ana"));
        assert_eq!(person.surname, None);
        assert_eq!(person.national_id.as_deref(), Some("12345678900"));
        assert_eq!(person.birth_date.as_deref(), Some("1"));
    }

    #[test]
    fn from_json_object_rejects_nested_values() {
        let fields = object(serde_json::json!({"cpf": ["1"]}));
        let err = Person::from_json_object(&fields).unwrap_err();
        assert!(err.contains("cpf"));

        let fields = object(serde_json::json!({"nome": {"first": "Ana"}}));
        assert!(Person::from_json_object(&fields).is_err());
    }
}
