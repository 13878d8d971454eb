// * Splits an experience page title into its person fields.
// * Expected shape: `山田花子（女性）年齢：25歳 留学期間：3ヶ月`

use thiserror::Error;

const OPEN_PAREN: &str = "（";
const CLOSE_PAREN: &str = "）";
const AGE_LABEL: &str = "年齢：";
const PERIOD_LABEL: &str = "留学期間：";
const PERIOD_STEM: &str = "留学期間";

#[derive(Debug, Error, PartialEq)]
pub enum TitleParseError {
    #[error("delimiter {delimiter:?} missing from title {title:?}")]
    MissingDelimiter {
        delimiter: &'static str,
        title: String,
    },
}

/// Person fields carried by an experience page title.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleFields {
    pub name: String,
    pub gender: String,
    pub age: String,
    pub period: String,
}

pub fn parse_title(title: &str) -> Result<TitleFields, TitleParseError> {
    let missing = |delimiter: &'static str| TitleParseError::MissingDelimiter {
        delimiter,
        title: title.to_string(),
    };

    let (name, after_paren) = title.split_once(OPEN_PAREN).ok_or_else(|| missing(OPEN_PAREN))?;
    let (gender, _) = after_paren
        .split_once(CLOSE_PAREN)
        .ok_or_else(|| missing(CLOSE_PAREN))?;

    let (_, after_age) = title.split_once(AGE_LABEL).ok_or_else(|| missing(AGE_LABEL))?;
    let (age, _) = after_age
        .split_once(PERIOD_STEM)
        .ok_or_else(|| missing(PERIOD_STEM))?;

    let (_, period) = title
        .split_once(PERIOD_LABEL)
        .ok_or_else(|| missing(PERIOD_LABEL))?;

    Ok(TitleFields {
        name: name.to_string(),
        gender: gender.to_string(),
        age: age.trim().to_string(),
        period: period.to_string(),
    })
}
