use std::path::Path;

use anyhow::{bail, Context, Result};

use super::types::SuiteSpec;

/// Load and validate a declarative suite from a YAML file.
pub fn parse_suite_file(path: &Path) -> Result<SuiteSpec> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read suite file: {}", path.display()))?;
    parse_suite_content(&content)
        .with_context(|| format!("Invalid suite file: {}", path.display()))
}

pub fn parse_suite_content(content: &str) -> Result<SuiteSpec> {
    let suite: SuiteSpec = serde_yaml::from_str(content)?;
    validate(&suite)?;
    Ok(suite)
}

fn validate(suite: &SuiteSpec) -> Result<()> {
    if suite.scenarios.is_empty() {
        bail!("suite '{}' has no scenarios", suite.name);
    }
    for scenario in &suite.scenarios {
        if scenario.steps.is_empty() {
            bail!("scenario '{}' has no steps", scenario.name);
        }
        for step in &scenario.steps {
            if step.name.trim().is_empty() {
                bail!("scenario '{}' has a step without a name", scenario.name);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::{CheckSpec, HttpMethod};

    #[test]
    fn test_parse_simple_suite() {
        let yaml = r#"
name: smoke
scenarios:
  - name: catalog
    steps:
      - name: products
        request:
          method: GET
          path: products
        checks:
          - nonEmptyList
          - requiredFields: [id, name, price]
          - forbidField: _id
      - name: fetch-user
        request:
          method: GET
          path: users/${userUid}
        requires: [userUid]
        checks:
          - equals:
              field: uid
              value: ${userUid}
        save:
          balance: walletBalance
"#;

        let suite = parse_suite_content(yaml).unwrap();
        assert_eq!(suite.name, "smoke");
        assert_eq!(suite.scenarios.len(), 1);

        let steps = &suite.scenarios[0].steps;
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].request.method, HttpMethod::Get);
        assert_eq!(steps[0].checks[0], CheckSpec::NonEmptyList);
        assert_eq!(
            steps[0].checks[2],
            CheckSpec::ForbidField("_id".to_string())
        );
        assert_eq!(steps[1].requires, vec!["userUid".to_string()]);
        assert_eq!(steps[1].save.get("balance").unwrap(), "walletBalance");
        assert_eq!(steps[1].display(), "GET /users/${userUid}");
    }

    #[test]
    fn test_shipped_suite_parses() {
        let suite = parse_suite_file(Path::new("suites/catalog-smoke.yaml")).unwrap();
        assert_eq!(suite.name, "catalog-smoke");
        assert_eq!(suite.scenarios.len(), 2);

        let categories = &suite.scenarios[1].steps[1];
        assert!(categories.checks.contains(&CheckSpec::ListIncludes {
            field: "slug".to_string(),
            value: serde_json::json!("electronics"),
        }));
    }

    #[test]
    fn test_empty_scenario_rejected() {
        let yaml = r#"
name: broken
scenarios:
  - name: empty
    steps: []
"#;
        let err = parse_suite_content(yaml).unwrap_err();
        assert!(err.to_string().contains("no steps"));
    }
}
