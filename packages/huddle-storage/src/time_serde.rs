//! RFC 3339 timestamps on the wire. Deserialization also accepts a bare `YYYY-MM-DD` date, read
//! as midnight UTC, since clients and agent tools often send plain dates for range bounds.

pub mod option;

use serde::{Deserialize, Deserializer, Serializer};
use time::{
	Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description,
};

pub fn format_timestamp(value: &OffsetDateTime) -> Result<String, time::error::Format> {
	value.format(&Rfc3339)
}

pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
	let raw = raw.trim();

	match OffsetDateTime::parse(raw, &Rfc3339) {
		Ok(value) => Ok(value),
		Err(err) => match Date::parse(raw, format_description!("[year]-[month]-[day]")) {
			Ok(date) => Ok(date.midnight().assume_utc()),
			Err(_) => Err(err),
		},
	}
}

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = format_timestamp(value).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse_timestamp(&raw).map_err(serde::de::Error::custom)
}
