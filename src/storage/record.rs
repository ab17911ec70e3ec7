use std::{fmt, str::FromStr};

use super::error::{Error, Result};

/// A single inventory line item.
///
/// On disk a record is one line holding its four fields separated by whitespace:
/// `name quantity wholesale retail`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub quantity: i64,
    pub wholesale: f64,
    pub retail: f64,
}

impl Record {
    /// Builds a record from user input, rejecting anything the store should not hold.
    ///
    /// Records decoded from the store skip these checks; existing lines are trusted as-is.
    pub fn new(
        name: impl Into<String>,
        quantity: i64,
        wholesale: f64,
        retail: f64,
    ) -> Result<Self> {
        // `+ 0.0` turns a typed `-0` into `0`
        let record = Self {
            name: name.into(),
            quantity,
            wholesale: wholesale + 0.0,
            retail: retail + 0.0,
        };
        record.validate()?;

        Ok(record)
    }

    /// Checks the invariants every newly written record must hold
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidInput("item name cannot be empty".into()));
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(Error::InvalidInput(format!(
                "item name `{}` cannot contain whitespace",
                self.name
            )));
        }
        if self.quantity < 0 {
            return Err(Error::InvalidInput(
                "quantities and costs cannot be less than 0".into(),
            ));
        }
        for cost in [self.wholesale, self.retail] {
            if !cost.is_finite() {
                return Err(Error::InvalidInput(format!("`{cost}` is not a valid cost")));
            }
            if cost < 0.0 {
                return Err(Error::InvalidInput(
                    "quantities and costs cannot be less than 0".into(),
                ));
            }
        }

        Ok(())
    }

    /// Value of the stock on hand at wholesale prices
    pub fn wholesale_value(&self) -> f64 {
        self.wholesale * self.quantity as f64
    }

    /// Value of the stock on hand at retail prices
    pub fn retail_value(&self) -> f64 {
        self.retail * self.quantity as f64
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.name, self.quantity, self.wholesale, self.retail
        )
    }
}

impl FromStr for Record {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let &[name, quantity, wholesale, retail] = tokens.as_slice() else {
            return Err(Error::MalformedRecord(format!(
                "expected 4 fields, found {}",
                tokens.len()
            )));
        };

        Ok(Self {
            name: name.to_string(),
            quantity: parse_field(quantity, "quantity")?,
            wholesale: parse_field(wholesale, "wholesale cost")?,
            retail: parse_field(retail, "retail cost")?,
        })
    }
}

fn parse_field<T: FromStr>(token: &str, field: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| Error::MalformedRecord(format!("`{token}` is not a valid {field}")))
}
