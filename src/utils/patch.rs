use serde::{Deserialize, Deserializer};

/// Отличает отсутствующее поле от явного null: None — поле не передано,
/// Some(None) — передан null и значение нужно очистить.
/// Используется вместе с #[serde(default)] на поле Option<Option<T>>.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use crate::models::{UpdateLocationRequest, UpdateUserRequest};

    #[test]
    fn test_absent_field_is_left_untouched() {
        let request: UpdateLocationRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.description, None);
    }

    #[test]
    fn test_null_clears_description() {
        let request: UpdateLocationRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(request.description, Some(None));
    }

    #[test]
    fn test_value_applies() {
        let request: UpdateLocationRequest =
            serde_json::from_str(r#"{"description": "центр города"}"#).unwrap();
        assert_eq!(request.description, Some(Some("центр города".to_string())));
    }

    #[test]
    fn test_null_clears_email() {
        let request: UpdateUserRequest = serde_json::from_str(r#"{"email": null}"#).unwrap();
        assert_eq!(request.email, Some(None));

        let request: UpdateUserRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.email, None);
    }
}
