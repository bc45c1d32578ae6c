//! Postgres wire adapters for [`Value`].

use super::Value;
use bytes::BytesMut;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::error::Error;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type};

type BoxError = Box<dyn Error + Sync + Send>;

/// Borrowing bind adapter.
///
/// The server infers a type for every `$n`; integers, floats and strings are converted to that
/// type here so `WHERE actor_id = ?` accepts `34`, `34_i64` or `"34"` alike. A conversion that
/// would change the value, or a pairing with no conversion at all, is an error.
#[derive(Debug)]
pub(crate) struct ValueParam<'a>(pub(crate) &'a Value);

impl ToSql for ValueParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => match *ty {
                Type::BOOL => v.to_sql(ty, out),
                _ if is_text(ty) => v.to_string().to_sql(ty, out),
                _ => Err(mismatch("boolean", ty)),
            },
            Value::Int(v) => int_to_sql(*v, ty, out),
            Value::Float(v) => float_to_sql(*v, ty, out),
            Value::Decimal(v) => decimal_to_sql(v, ty, out),
            Value::Text(v) => text_to_sql(v, ty, out),
            // Unmapped column types decode to their raw wire bytes; those go back unchanged.
            Value::Bytes(v) if *ty == Type::BYTEA || !is_known_scalar(ty) => {
                v.as_slice().to_sql(ty, out)
            }
            Value::Bytes(_) => Err(mismatch("bytes", ty)),
            Value::List(items) => match ty.kind() {
                Kind::Array(_) => items
                    .iter()
                    .map(ValueParam)
                    .collect::<Vec<_>>()
                    .to_sql(ty, out),
                _ => json_to_sql(self.0, ty, out),
            },
            Value::Map(_) => json_to_sql(self.0, ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

fn mismatch(found: &str, ty: &Type) -> BoxError {
    format!("cannot bind {found} value to a parameter of type {}", ty.name()).into()
}

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    )
}

/// Types [`ValueHolder`] decodes into something other than raw bytes.
fn is_known_scalar(ty: &Type) -> bool {
    is_text(ty)
        || matches!(
            *ty,
            Type::BOOL
                | Type::CHAR
                | Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::OID
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::NUMERIC
                | Type::JSON
                | Type::JSONB
                | Type::UUID
                | Type::DATE
                | Type::TIME
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::XML
        )
}

fn int_to_sql(v: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::CHAR => i8::try_from(v)?.to_sql(ty, out),
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        Type::INT8 => v.to_sql(ty, out),
        Type::OID => u32::try_from(v)?.to_sql(ty, out),
        Type::FLOAT4 => {
            let narrowed = v as f32;
            if narrowed as i128 != i128::from(v) {
                return Err(format!("integer {v} has no exact float4 representation").into());
            }
            narrowed.to_sql(ty, out)
        }
        Type::FLOAT8 => {
            let widened = v as f64;
            if widened as i128 != i128::from(v) {
                return Err(format!("integer {v} has no exact float8 representation").into());
            }
            widened.to_sql(ty, out)
        }
        Type::NUMERIC => Decimal::from(v).to_sql(ty, out),
        _ if is_text(ty) => v.to_string().to_sql(ty, out),
        _ => Err(mismatch("integer", ty)),
    }
}

fn float_to_sql(v: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::FLOAT4 => {
            let narrowed = v as f32;
            if v.is_finite() && narrowed.is_infinite() {
                return Err(format!("float {v} is out of range for float4").into());
            }
            narrowed.to_sql(ty, out)
        }
        Type::FLOAT8 => v.to_sql(ty, out),
        Type::CHAR | Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => {
            int_to_sql(float_to_int(v)?, ty, out)
        }
        Type::NUMERIC => Decimal::try_from(v)?.to_sql(ty, out),
        _ if is_text(ty) => v.to_string().to_sql(ty, out),
        _ => Err(mismatch("float", ty)),
    }
}

fn float_to_int(v: f64) -> Result<i64, BoxError> {
    // 2^63 is exact in f64, i64::MAX is not.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if v.fract() == 0.0 && (-LIMIT..LIMIT).contains(&v) {
        Ok(v as i64)
    } else {
        Err(format!("float {v} is not a whole number in integer range").into())
    }
}

fn decimal_to_sql(v: &Decimal, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::NUMERIC => v.to_sql(ty, out),
        Type::FLOAT4 => v
            .to_f32()
            .ok_or_else(|| BoxError::from(format!("decimal {v} does not fit float4")))?
            .to_sql(ty, out),
        Type::FLOAT8 => v
            .to_f64()
            .ok_or_else(|| BoxError::from(format!("decimal {v} does not fit float8")))?
            .to_sql(ty, out),
        Type::CHAR | Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => {
            if !v.fract().is_zero() {
                return Err(format!("decimal {v} is not a whole number").into());
            }
            let whole = v
                .to_i64()
                .ok_or_else(|| BoxError::from(format!("decimal {v} is out of integer range")))?;
            int_to_sql(whole, ty, out)
        }
        _ if is_text(ty) => v.to_string().to_sql(ty, out),
        _ => Err(mismatch("decimal", ty)),
    }
}

fn json_to_sql(value: &Value, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::JSON | Type::JSONB => serde_json::to_value(value)?.to_sql(ty, out),
        _ if is_text(ty) => serde_json::to_string(value)?.to_sql(ty, out),
        _ => Err(mismatch(value.type_name(), ty)),
    }
}

fn text_to_sql(v: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::BOOL => v.parse::<bool>()?.to_sql(ty, out),
        Type::INT2 => v.parse::<i16>()?.to_sql(ty, out),
        Type::INT4 => v.parse::<i32>()?.to_sql(ty, out),
        Type::INT8 => v.parse::<i64>()?.to_sql(ty, out),
        Type::FLOAT4 => v.parse::<f32>()?.to_sql(ty, out),
        Type::FLOAT8 => v.parse::<f64>()?.to_sql(ty, out),
        Type::NUMERIC => v.parse::<Decimal>()?.to_sql(ty, out),
        Type::UUID => uuid::Uuid::parse_str(v)?.to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(v)?.to_sql(ty, out),
        Type::DATE => v.parse::<NaiveDate>()?.to_sql(ty, out),
        Type::TIME => v.parse::<NaiveTime>()?.to_sql(ty, out),
        Type::TIMESTAMP => parse_timestamp(v)?.to_sql(ty, out),
        Type::TIMESTAMPTZ => parse_timestamptz(v)?.to_sql(ty, out),
        _ => v.to_sql(ty, out),
    }
}

/// ISO 8601 (`2005-05-24T22:53:30`) or Postgres output (`2005-05-24 22:53:30.125`).
fn parse_timestamp(v: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    v.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S%.f"))
}

/// RFC 3339 or Postgres output (`2005-05-24 22:53:30+00`).
fn parse_timestamptz(v: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(v)
        .or_else(|_| DateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S%.f%#z"))
}

/// Owning decode adapter: any column type becomes a [`Value`].
///
/// Types without a natural mapping keep their raw wire bytes as [`Value::Bytes`].
#[derive(Debug)]
pub(crate) struct ValueHolder(pub(crate) Value);

impl<'a> FromSql<'a> for ValueHolder {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let value = match *ty {
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::CHAR => Value::Int(i64::from(i8::from_sql(ty, raw)?)),
            Type::INT2 => Value::Int(i64::from(i16::from_sql(ty, raw)?)),
            Type::INT4 => Value::Int(i64::from(i32::from_sql(ty, raw)?)),
            Type::INT8 => Value::Int(i64::from_sql(ty, raw)?),
            Type::OID => Value::Int(i64::from(u32::from_sql(ty, raw)?)),
            Type::FLOAT4 => Value::Float(f64::from(f32::from_sql(ty, raw)?)),
            Type::FLOAT8 => Value::Float(f64::from_sql(ty, raw)?),
            Type::NUMERIC => Value::Decimal(Decimal::from_sql(ty, raw)?),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::XML | Type::UNKNOWN => {
                Value::Text(String::from_sql(ty, raw)?)
            }
            Type::JSON | Type::JSONB => Value::from(serde_json::Value::from_sql(ty, raw)?),
            Type::BYTEA => Value::Bytes(Vec::<u8>::from_sql(ty, raw)?),
            Type::UUID => Value::Text(uuid::Uuid::from_sql(ty, raw)?.to_string()),
            Type::DATE => Value::Text(NaiveDate::from_sql(ty, raw)?.to_string()),
            Type::TIME => Value::Text(NaiveTime::from_sql(ty, raw)?.to_string()),
            Type::TIMESTAMP => Value::Text(NaiveDateTime::from_sql(ty, raw)?.to_string()),
            Type::TIMESTAMPTZ => Value::Text(DateTime::<Utc>::from_sql(ty, raw)?.to_rfc3339()),
            _ => match ty.kind() {
                Kind::Array(_) => Value::List(
                    Vec::<ValueHolder>::from_sql(ty, raw)?
                        .into_iter()
                        .map(|h| h.0)
                        .collect(),
                ),
                Kind::Domain(inner) => ValueHolder::from_sql(inner, raw)?.0,
                Kind::Enum(_) => Value::Text(std::str::from_utf8(raw)?.to_string()),
                _ => Value::Bytes(raw.to_vec()),
            },
        };
        Ok(ValueHolder(value))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(ValueHolder(Value::Null))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}
