use std::{
    num::ParseIntError,
    path::{Component, Path},
};

use crate::{JobParameters, DEFAULT_DURATION_SECS, DEFAULT_START_SECS};

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("{field} is not a whole number of seconds: {value:?}")]
    NotANumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("output name must be a plain file name: {name:?}")]
    InvalidName { name: String },
}

/// Raw form fields, exactly as the user typed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobForm {
    pub name: String,
    pub start: String,
    pub time: String,
}

impl Default for JobForm {
    fn default() -> Self {
        JobForm {
            name: String::new(),
            start: DEFAULT_START_SECS.to_string(),
            time: DEFAULT_DURATION_SECS.to_string(),
        }
    }
}

fn parse_seconds(field: &'static str, value: &str) -> Result<Option<i64>, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|source| FormError::NotANumber {
            field,
            value: value.to_owned(),
            source,
        })
}

/// The output name ends up as a file argument to the engine, so it must be a
/// single path component and must not look like an option.
fn check_name(name: &str) -> Result<(), FormError> {
    let mut parts = Path::new(name).components();
    let plain = matches!((parts.next(), parts.next()), (Some(Component::Normal(_)), None))
        && !name.chars().any(std::path::is_separator)
        && !name.starts_with('-');
    if plain {
        Ok(())
    } else {
        Err(FormError::InvalidName {
            name: name.to_owned(),
        })
    }
}

impl JobForm {
    pub fn reset(&mut self) {
        *self = JobForm::default();
    }

    pub fn normalize(&self) -> Result<JobParameters, FormError> {
        let start = parse_seconds("start", &self.start)?;
        let time = parse_seconds("time", &self.time)?;
        let params = JobParameters::new(Some(self.name.as_str()), start, time);
        check_name(&params.name)?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_form_normalizes_to_default_params() {
        let params = JobForm::default().normalize().unwrap();
        assert_eq!(params, JobParameters::default());
    }

    #[test]
    fn blank_fields_fall_back() {
        let form = JobForm {
            name: String::new(),
            start: String::new(),
            time: " ".to_owned(),
        };
        assert_eq!(form.normalize().unwrap(), JobParameters::default());
    }

    #[test]
    fn typed_values() {
        let form = JobForm {
            name: "clip".to_owned(),
            start: "5".to_owned(),
            time: "3".to_owned(),
        };
        let params = form.normalize().unwrap();
        assert_eq!(params.name, "clip");
        assert_eq!(params.start, 5);
        assert_eq!(params.duration, 3);
    }

    #[test]
    fn garbage_is_reported_with_field() {
        let form = JobForm {
            time: "ten".to_owned(),
            ..Default::default()
        };
        match form.normalize() {
            Err(FormError::NotANumber { field, value, .. }) => {
                assert_eq!(field, "time");
                assert_eq!(value, "ten");
            }
            other => panic!("expected NotANumber, got {:?}", other),
        }
    }

    #[test]
    fn names_must_stay_a_single_file() {
        for bad in ["../x", "a/b", "-x", "..", ".", "clip/", "/etc/passwd"] {
            let form = JobForm {
                name: bad.to_owned(),
                ..Default::default()
            };
            assert!(
                matches!(form.normalize(), Err(FormError::InvalidName { .. })),
                "{:?} should be rejected",
                bad
            );
        }
        for good in ["clip", "my clip", "a.b", "x-1"] {
            let form = JobForm {
                name: good.to_owned(),
                ..Default::default()
            };
            assert_eq!(form.normalize().unwrap().name, good);
        }
    }

    #[test]
    fn reset_restores_defaults() {
        let mut form = JobForm {
            name: "a".to_owned(),
            start: "1".to_owned(),
            time: "2".to_owned(),
        };
        form.reset();
        assert_eq!(form, JobForm::default());
    }
}
