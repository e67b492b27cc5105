use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_CODENAME: &str = "CODENAME";

const SAMPLE_ORIGINAL_NAME: &str = "photo.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingRule {
    DateCodenameName,
    #[default]
    DateName,
    CodenameDateName,
    NameDate,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("未対応の命名ルールです: {0}")]
    Unknown(String),
}

impl NamingRule {
    pub const ALL: [NamingRule; 4] = [
        NamingRule::DateCodenameName,
        NamingRule::DateName,
        NamingRule::CodenameDateName,
        NamingRule::NameDate,
    ];

    pub fn id(self) -> &'static str {
        match self {
            NamingRule::DateCodenameName => "date_codename_name",
            NamingRule::DateName => "date_name",
            NamingRule::CodenameDateName => "codename_date_name",
            NamingRule::NameDate => "name_date",
        }
    }

    pub fn from_id(id: &str) -> Self {
        id.parse().unwrap_or_default()
    }

    pub fn uses_codename(self) -> bool {
        matches!(
            self,
            NamingRule::DateCodenameName | NamingRule::CodenameDateName
        )
    }
}

impl FromStr for NamingRule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NamingRule::ALL
            .into_iter()
            .find(|rule| rule.id() == s)
            .ok_or_else(|| RuleError::Unknown(s.to_string()))
    }
}

impl fmt::Display for NamingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

pub fn compute_name(rule: NamingRule, codename: &str, date: &str, original_name: &str) -> String {
    let date = compact_date(date);
    let codename = effective_codename(codename);

    match rule {
        NamingRule::DateCodenameName => format!("{}_{}_{}", date, codename, original_name),
        NamingRule::DateName => format!("{}_{}", date, original_name),
        NamingRule::CodenameDateName => format!("{}_{}_{}", codename, date, original_name),
        NamingRule::NameDate => match split_extension(original_name) {
            Some((stem, ext)) => format!("{}_{}.{}", stem, date, ext),
            None => format!("{}_{}", original_name, date),
        },
    }
}

pub fn compute_name_with_id(rule_id: &str, codename: &str, date: &str, original_name: &str) -> String {
    compute_name(NamingRule::from_id(rule_id), codename, date, original_name)
}

pub fn sample_name(rule: NamingRule, codename: &str, date: &str) -> String {
    compute_name(rule, codename, date, SAMPLE_ORIGINAL_NAME)
}

/// `YYYY-MM-DD` -> `YYYYMMDD`.
pub fn compact_date(date: &str) -> String {
    date.chars().filter(|ch| *ch != '-').collect()
}

fn effective_codename(codename: &str) -> &str {
    let trimmed = codename.trim();
    if trimmed.is_empty() {
        DEFAULT_CODENAME
    } else {
        trimmed
    }
}

fn split_extension(name: &str) -> Option<(&str, &str)> {
    if name == "." {
        return None;
    }
    let pos = name.rfind('.')?;
    Some((&name[..pos], &name[pos + 1..]))
}
