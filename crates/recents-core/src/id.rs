use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, num::ParseIntError, str::FromStr};

/// Identifier of a task, as assigned by the host when it enumerates running tasks.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct TaskId(pub u32);

impl TaskId {
    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for TaskId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        Ok(Self(digits.parse()?))
    }
}

impl Serialize for TaskId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        u32::deserialize(d).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_display_roundtrip() {
        let id = TaskId(42);
        assert_eq!(id.to_string(), "#42");
        let parsed: TaskId = id.to_string().parse().expect("must parse task id");
        assert_eq!(parsed, id);
    }

    #[test]
    fn task_id_parses_bare_digits() {
        let parsed: TaskId = "7".parse().expect("must parse bare task id");
        assert_eq!(parsed.get(), 7);
        assert!("x7".parse::<TaskId>().is_err());
    }

    #[test]
    fn task_id_serializes_as_number() {
        let json = serde_json::to_string(&TaskId(3)).expect("serialize");
        assert_eq!(json, "3");
        let back: TaskId = serde_json::from_str("9").expect("deserialize");
        assert_eq!(back, TaskId(9));
    }
}
