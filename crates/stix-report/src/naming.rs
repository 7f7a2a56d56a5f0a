//! The board's standard upload file name.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use stix_model::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchoolLevel {
    Elementary,
    Secondary,
}

impl SchoolLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Elementary => "elementary",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for SchoolLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchoolLevel {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "elementary" => Ok(Self::Elementary),
            "secondary" => Ok(Self::Secondary),
            other => bail!("school level must be 'elementary' or 'secondary', got '{other}'"),
        }
    }
}

/// `{YYYYMMDD}_{board}_{level}_STIX.xml` from `CreateDate` and
/// `SchoolBoard/BoardNumber`.
pub fn standard_file_name(metadata: &Metadata, level: SchoolLevel) -> Result<String> {
    let create_date = metadata.create_date.trim();
    let Some(date) = create_date
        .get(..10)
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
    else {
        bail!("metadata CreateDate '{create_date}' does not start with YYYY-MM-DD");
    };
    let board = metadata.board_number.trim();
    if board.is_empty() {
        bail!("metadata SchoolBoard/BoardNumber is empty");
    }
    if board.contains(['/', '\\']) {
        bail!("board number '{board}' cannot be used in a file name");
    }
    Ok(format!("{}_{board}_{level}_STIX.xml", date.format("%Y%m%d")))
}
