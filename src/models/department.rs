use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Departments an intern or staff member can belong to.
/// Corresponds to the `department` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "department")]
pub enum Department {
    Engineering,
    #[sqlx(rename = "HR")]
    #[serde(rename = "HR")]
    Hr,
    Finance,
    Operations,
    Sales,
    Other,
}

impl Department {
    pub const ALL: [Department; 6] = [
        Department::Engineering,
        Department::Hr,
        Department::Finance,
        Department::Operations,
        Department::Sales,
        Department::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Engineering => "Engineering",
            Department::Hr => "HR",
            Department::Finance => "Finance",
            Department::Operations => "Operations",
            Department::Sales => "Sales",
            Department::Other => "Other",
        }
    }

    /// Joins departments into the comma-delimited form stored on assignments.
    /// Duplicates are dropped, first occurrence wins.
    pub fn join(departments: &[Department]) -> String {
        let mut seen: Vec<Department> = Vec::with_capacity(departments.len());
        for department in departments {
            if !seen.contains(department) {
                seen.push(*department);
            }
        }
        seen.iter()
            .map(Department::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Department::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown department: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!("HR".parse::<Department>().unwrap(), Department::Hr);
        assert_eq!(" Finance ".parse::<Department>().unwrap(), Department::Finance);
        assert!("hr".parse::<Department>().is_err());
        assert_eq!(Department::Hr.to_string(), "HR");
    }

    #[test]
    fn test_join_deduplicates() {
        let joined = Department::join(&[Department::Engineering, Department::Hr, Department::Engineering]);
        assert_eq!(joined, "Engineering,HR");
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&Department::Hr).unwrap();
        assert_eq!(json, "\"HR\"");
        let parsed: Department = serde_json::from_str("\"Operations\"").unwrap();
        assert_eq!(parsed, Department::Operations);
    }
}
