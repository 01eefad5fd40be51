//! Inbound payload validation.
//!
//! Each input type implements [`Load`]: the raw JSON body is checked field by
//! field and every failure is collected into a [`FieldErrors`] map keyed by
//! field name, so a client sees all of its mistakes in one response. Keys the
//! schema does not declare are dropped. Outbound shaping is the `Serialize`
//! derive on the records in [`crate::models`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

pub const MISSING: &str = "Missing data for required field.";
pub const NULL: &str = "Field may not be null.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const NOT_AN_INTEGER: &str = "Not a valid integer.";
pub const NOT_A_NUMBER: &str = "Not a valid number.";
pub const NOT_A_DATE: &str = "Not a valid date.";
pub const INVALID_INPUT: &str = "Invalid input type.";

/// Key used for errors about the payload as a whole.
pub const SCHEMA_KEY: &str = "_schema";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("{} field(s) failed validation", .0.len())]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(SCHEMA_KEY, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn absorb(&mut self, result: Result<(), ValidationErrors>) {
        let Err(errors) = result else {
            return;
        };
        for (field, failures) in errors.field_errors() {
            for failure in failures {
                let message = failure
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| failure.code.to_string());
                self.add(&field.to_string(), message);
            }
        }
    }
}

/// Turns an untyped JSON body into a typed input record.
pub trait Load: Sized {
    fn load(value: &Value) -> Result<Self, FieldErrors>;
}

type Parser<T> = fn(&Value) -> Result<T, &'static str>;

struct Fields<'a> {
    map: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> Fields<'a> {
    fn of(value: &'a Value) -> Result<Self, FieldErrors> {
        match value {
            Value::Object(map) => Ok(Fields {
                map,
                errors: FieldErrors::new(),
            }),
            _ => Err(FieldErrors::schema(INVALID_INPUT)),
        }
    }

    fn required<T>(&mut self, key: &str, parse: Parser<T>) -> Option<T> {
        let map = self.map;
        match map.get(key) {
            None => {
                self.errors.add(key, MISSING);
                None
            }
            Some(value) => self.parse(key, value, parse),
        }
    }

    fn optional<T>(&mut self, key: &str, parse: Parser<T>) -> Option<T> {
        let map = self.map;
        map.get(key)
            .and_then(|value| self.parse(key, value, parse))
    }

    fn parse<T>(&mut self, key: &str, value: &Value, parse: Parser<T>) -> Option<T> {
        if value.is_null() {
            self.errors.add(key, NULL);
            return None;
        }
        match parse(value) {
            Ok(parsed) => Some(parsed),
            Err(message) => {
                self.errors.add(key, message);
                None
            }
        }
    }

    fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

fn string(value: &Value) -> Result<String, &'static str> {
    value.as_str().map(str::to_string).ok_or(NOT_A_STRING)
}

fn integer(value: &Value) -> Result<i64, &'static str> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .ok_or(NOT_AN_INTEGER),
        Value::String(s) => s.trim().parse().map_err(|_| NOT_AN_INTEGER),
        _ => Err(NOT_AN_INTEGER),
    }
}

fn number(value: &Value) -> Result<f64, &'static str> {
    match value {
        Value::Number(n) => n.as_f64().ok_or(NOT_A_NUMBER),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or(NOT_A_NUMBER),
        _ => Err(NOT_A_NUMBER),
    }
}

fn date(value: &Value) -> Result<NaiveDate, &'static str> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .ok_or(NOT_A_DATE)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerInput {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Validate)]
struct CustomerDraft {
    #[validate(length(max = 255, message = "Longer than maximum length 255."))]
    name: Option<String>,
    #[validate(length(max = 320, message = "Longer than maximum length 320."))]
    email: Option<String>,
    #[validate(length(max = 15, message = "Longer than maximum length 15."))]
    phone: Option<String>,
}

impl Load for CustomerInput {
    fn load(value: &Value) -> Result<Self, FieldErrors> {
        let mut fields = Fields::of(value)?;
        fields.optional("customer_id", integer);
        let draft = CustomerDraft {
            name: fields.required("name", string),
            email: fields.required("email", string),
            phone: fields.required("phone", string),
        };

        let mut errors = fields.into_errors();
        errors.absorb(draft.validate());

        match draft {
            CustomerDraft {
                name: Some(name),
                email: Some(email),
                phone: Some(phone),
            } if errors.is_empty() => Ok(CustomerInput { name, email, phone }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub price: f64,
}

#[derive(Validate)]
struct ProductDraft {
    #[validate(length(max = 255, message = "Longer than maximum length 255."))]
    name: Option<String>,
    price: Option<f64>,
}

impl Load for ProductInput {
    fn load(value: &Value) -> Result<Self, FieldErrors> {
        let mut fields = Fields::of(value)?;
        fields.optional("product_id", integer);
        let draft = ProductDraft {
            name: fields.required("name", string),
            price: fields.required("price", number),
        };

        let mut errors = fields.into_errors();
        errors.absorb(draft.validate());

        match draft {
            ProductDraft {
                name: Some(name),
                price: Some(price),
            } if errors.is_empty() => Ok(ProductInput { name, price }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderInput {
    pub date: NaiveDate,
    pub customer_id: i64,
    pub delivery_date: NaiveDate,
    pub ordered_product: String,
}

#[derive(Validate)]
struct OrderDraft {
    date: Option<NaiveDate>,
    customer_id: Option<i64>,
    delivery_date: Option<NaiveDate>,
    #[validate(length(max = 255, message = "Longer than maximum length 255."))]
    ordered_product: Option<String>,
}

impl Load for OrderInput {
    fn load(value: &Value) -> Result<Self, FieldErrors> {
        let mut fields = Fields::of(value)?;
        fields.optional("order_id", integer);
        let draft = OrderDraft {
            date: fields.required("date", date),
            customer_id: fields.required("customer_id", integer),
            delivery_date: fields.required("delivery_date", date),
            ordered_product: fields.required("ordered_product", string),
        };

        let mut errors = fields.into_errors();
        errors.absorb(draft.validate());

        match draft {
            OrderDraft {
                date: Some(date),
                customer_id: Some(customer_id),
                delivery_date: Some(delivery_date),
                ordered_product: Some(ordered_product),
            } if errors.is_empty() => Ok(OrderInput {
                date,
                customer_id,
                delivery_date,
                ordered_product,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn customer_loads_and_drops_unknown_keys() {
        let input = CustomerInput::load(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "phone": "555-0100",
            "nickname": "countess",
        }))
        .unwrap();

        assert_eq!(
            input,
            CustomerInput {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                phone: "555-0100".to_string(),
            }
        );
    }

    #[test]
    fn every_missing_field_is_reported() {
        let errors = CustomerInput::load(&json!({ "name": "Ada" })).unwrap_err();

        assert_eq!(errors.fields().collect::<Vec<_>>(), ["email", "phone"]);
        assert_eq!(errors.get("email"), Some(&[MISSING.to_string()][..]));
    }

    #[test]
    fn type_and_length_failures_are_reported_together() {
        let errors = CustomerInput::load(&json!({
            "name": 42,
            "email": "ada@example.com",
            "phone": "0123456789012345",
        }))
        .unwrap_err();

        assert_eq!(errors.get("name"), Some(&[NOT_A_STRING.to_string()][..]));
        assert_eq!(
            errors.get("phone"),
            Some(&["Longer than maximum length 15.".to_string()][..])
        );
        assert_eq!(errors.get("email"), None);
    }

    #[test]
    fn null_is_rejected() {
        let errors =
            ProductInput::load(&json!({ "name": null, "price": 3.5 })).unwrap_err();
        assert_eq!(errors.get("name"), Some(&[NULL.to_string()][..]));
    }

    #[test]
    fn identity_is_optional_but_type_checked() {
        let product = ProductInput::load(&json!({ "product_id": 9, "name": "Pen", "price": 2 }));
        assert_eq!(
            product.unwrap(),
            ProductInput {
                name: "Pen".to_string(),
                price: 2.0,
            }
        );

        let errors =
            ProductInput::load(&json!({ "product_id": "nine", "name": "Pen", "price": 2 }))
                .unwrap_err();
        assert_eq!(
            errors.get("product_id"),
            Some(&[NOT_AN_INTEGER.to_string()][..])
        );
    }

    #[test]
    fn price_accepts_numeric_strings() {
        let product = ProductInput::load(&json!({ "name": "Pen", "price": "1.25" })).unwrap();
        assert_eq!(product.price, 1.25);

        let errors = ProductInput::load(&json!({ "name": "Pen", "price": true })).unwrap_err();
        assert_eq!(errors.get("price"), Some(&[NOT_A_NUMBER.to_string()][..]));
    }

    #[test]
    fn order_parses_dates_and_integer_strings() {
        let order = OrderInput::load(&json!({
            "date": "2024-02-29",
            "customer_id": "12",
            "delivery_date": "2024-03-04",
            "ordered_product": "Lamp",
        }))
        .unwrap();

        assert_eq!(order.date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(order.customer_id, 12);
    }

    #[test]
    fn order_rejects_bad_dates_and_fractional_ids() {
        let errors = OrderInput::load(&json!({
            "date": "2023-02-29",
            "customer_id": 1.5,
            "delivery_date": "03/04/2024",
        }))
        .unwrap_err();

        assert_eq!(errors.get("date"), Some(&[NOT_A_DATE.to_string()][..]));
        assert_eq!(
            errors.get("customer_id"),
            Some(&[NOT_AN_INTEGER.to_string()][..])
        );
        assert_eq!(
            errors.get("delivery_date"),
            Some(&[NOT_A_DATE.to_string()][..])
        );
        assert_eq!(
            errors.get("ordered_product"),
            Some(&[MISSING.to_string()][..])
        );
    }

    #[test]
    fn non_object_payload_is_a_schema_error() {
        let errors = OrderInput::load(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({ "_schema": [INVALID_INPUT] })
        );
    }

    #[test]
    fn errors_serialize_as_field_map() {
        let errors = ProductInput::load(&json!({})).unwrap_err();
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({ "name": [MISSING], "price": [MISSING] })
        );
    }
}
