use std::collections::BTreeMap;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::parser::types::{
    CheckSpec, HttpMethod, RequestSpec, ScenarioSpec, StepSpec, SuiteSpec,
};

/// Marker the liveness endpoint must echo
pub const ROOT_MARKER: &str = "E-commerce API is running";

/// Wallet amounts are integral minor-currency units; the balance invariant
/// is exact integer arithmetic, no tolerance.
pub const INITIAL_BALANCE: i64 = 2_000;
pub const ORDER_TOTAL: i64 = 900_000;
pub const RECHARGE_AMOUNT: i64 = 500_000;

/// Closed-form expected balance after the wallet flow:
/// initial − order total + recharge.
pub fn expected_final_balance() -> i64 {
    INITIAL_BALANCE - ORDER_TOTAL + RECHARGE_AMOUNT
}

/// The builtin e-commerce contract suite. Each invocation generates a
/// fresh user uid and recharge reference so runs never collide on the
/// remote service.
pub fn builtin() -> SuiteSpec {
    let uid = format!("test_user_{}", short_id());
    let reference = format!("QR_{}", short_id());

    SuiteSpec {
        name: "e-commerce-contract".to_string(),
        scenarios: vec![
            api_root(),
            products(),
            categories(),
            user_wallet_flow(&uid, &reference),
        ],
    }
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn api_root() -> ScenarioSpec {
    ScenarioSpec {
        name: "api-root".to_string(),
        steps: vec![StepSpec {
            name: "liveness".to_string(),
            request: RequestSpec {
                method: HttpMethod::Get,
                path: "/".to_string(),
                body: None,
            },
            requires: Vec::new(),
            checks: vec![CheckSpec::Contains {
                field: "message".to_string(),
                needle: ROOT_MARKER.to_string(),
            }],
            save: BTreeMap::new(),
        }],
    }
}

fn products() -> ScenarioSpec {
    ScenarioSpec {
        name: "products".to_string(),
        steps: vec![list_step(
            "list-products",
            "products",
            &[
                "id",
                "name",
                "nameEn",
                "price",
                "category",
                "categoryAr",
                "rating",
                "stock",
            ],
        )],
    }
}

/// Category slugs the seeded catalog must expose
pub const EXPECTED_CATEGORY_SLUGS: [&str; 3] = ["electronics", "clothing", "food"];

fn categories() -> ScenarioSpec {
    let mut step = list_step(
        "list-categories",
        "categories",
        &["id", "name", "nameEn", "slug", "active"],
    );
    for slug in EXPECTED_CATEGORY_SLUGS {
        step.checks.push(CheckSpec::ListIncludes {
            field: "slug".to_string(),
            value: json!(slug),
        });
    }

    ScenarioSpec {
        name: "categories".to_string(),
        steps: vec![step],
    }
}

/// Read-only listing: non-empty, required fields on the first element, and
/// no storage-internal identifier leaking next to the public `id`.
fn list_step(name: &str, path: &str, required: &[&str]) -> StepSpec {
    StepSpec {
        name: name.to_string(),
        request: RequestSpec {
            method: HttpMethod::Get,
            path: path.to_string(),
            body: None,
        },
        requires: Vec::new(),
        checks: vec![
            CheckSpec::NonEmptyList,
            CheckSpec::RequiredFields(required.iter().map(|s| s.to_string()).collect()),
            CheckSpec::ForbidField("_id".to_string()),
        ],
        save: BTreeMap::new(),
    }
}

/// create user -> fetch user -> create order -> recharge wallet -> verify
/// balance. Every step after creation requires the `userUid` binding, so a
/// failed creation short-circuits the chain without further HTTP calls.
fn user_wallet_flow(uid: &str, reference: &str) -> ScenarioSpec {
    ScenarioSpec {
        name: "user-wallet-flow".to_string(),
        steps: vec![
            create_user(uid),
            fetch_user(
                "fetch-user",
                vec![
                    equals("uid", json!("${userUid}")),
                    equals("walletBalance", json!(INITIAL_BALANCE)),
                ],
            ),
            create_order(),
            recharge_wallet(reference),
            fetch_user(
                "verify-balance",
                vec![equals("walletBalance", json!(expected_final_balance()))],
            ),
        ],
    }
}

fn create_user(uid: &str) -> StepSpec {
    let body = json!({
        "uid": uid,
        "email": format!("{}@example.com", uid),
        "name": "أحمد محمد",
        "nameEn": "Ahmed Mohammed",
        "phone": "+966501234567",
        "walletBalance": INITIAL_BALANCE,
        "address": {
            "street": "شارع الملك فهد",
            "city": "الرياض",
            "country": "السعودية"
        }
    });

    StepSpec {
        name: "create-user".to_string(),
        request: RequestSpec {
            method: HttpMethod::Post,
            path: "users".to_string(),
            body: Some(body),
        },
        requires: Vec::new(),
        checks: vec![
            CheckSpec::RequiredFields(
                ["id", "uid", "email", "name", "walletBalance", "createdAt"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
            CheckSpec::ForbidField("_id".to_string()),
            equals("walletBalance", json!(INITIAL_BALANCE)),
        ],
        save: BTreeMap::from([("userUid".to_string(), "uid".to_string())]),
    }
}

fn fetch_user(name: &str, extra_checks: Vec<CheckSpec>) -> StepSpec {
    let mut checks = vec![
        CheckSpec::RequiredFields(
            ["id", "uid", "email", "name", "walletBalance"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        ),
        CheckSpec::ForbidField("_id".to_string()),
    ];
    checks.extend(extra_checks);

    StepSpec {
        name: name.to_string(),
        request: RequestSpec {
            method: HttpMethod::Get,
            path: "users/${userUid}".to_string(),
            body: None,
        },
        requires: vec!["userUid".to_string()],
        checks,
        save: BTreeMap::new(),
    }
}

fn create_order() -> StepSpec {
    let body = json!({
        "userId": "${userUid}",
        "items": [
            {
                "productId": "test_product_1",
                "name": "آيفون 15 برو",
                "price": 850_000,
                "quantity": 1
            },
            {
                "productId": "test_product_2",
                "name": "قميص قطني أنيق",
                "price": 25_000,
                "quantity": 2
            }
        ],
        "total": ORDER_TOTAL,
        "paymentMethod": "wallet",
        "shippingAddress": {
            "name": "أحمد محمد",
            "street": "شارع الملك فهد",
            "city": "الرياض",
            "country": "السعودية",
            "phone": "+966501234567"
        },
        "customerNotes": "يرجى التوصيل في المساء"
    });

    StepSpec {
        name: "create-order".to_string(),
        request: RequestSpec {
            method: HttpMethod::Post,
            path: "orders".to_string(),
            body: Some(body),
        },
        requires: vec!["userUid".to_string()],
        checks: vec![
            CheckSpec::RequiredFields(
                [
                    "id",
                    "orderNumber",
                    "status",
                    "paymentStatus",
                    "total",
                    "items",
                    "userId",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ),
            CheckSpec::ForbidField("_id".to_string()),
            equals("total", json!(ORDER_TOTAL)),
            equals("paymentMethod", json!("wallet")),
        ],
        save: BTreeMap::new(),
    }
}

/// A `qr_code` recharge completes synchronously; the response must already
/// carry the completed status.
fn recharge_wallet(reference: &str) -> StepSpec {
    let body = json!({
        "userId": "${userUid}",
        "amount": RECHARGE_AMOUNT,
        "method": "qr_code",
        "reference": reference
    });

    StepSpec {
        name: "recharge-wallet".to_string(),
        request: RequestSpec {
            method: HttpMethod::Post,
            path: "wallet/recharge".to_string(),
            body: Some(body),
        },
        requires: vec!["userUid".to_string()],
        checks: vec![
            CheckSpec::RequiredFields(
                ["id", "type", "method", "amount", "status", "userId"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
            CheckSpec::ForbidField("_id".to_string()),
            equals("amount", json!(RECHARGE_AMOUNT)),
            equals("method", json!("qr_code")),
            equals("status", json!("completed")),
        ],
        save: BTreeMap::new(),
    }
}

fn equals(field: &str, value: Value) -> CheckSpec {
    CheckSpec::Equals {
        field: field.to_string(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_balance_is_closed_form() {
        // 2000 - 900000 + 500000
        assert_eq!(expected_final_balance(), -398_000);
    }

    #[test]
    fn test_builtin_suite_shape() {
        let suite = builtin();
        assert_eq!(suite.scenarios.len(), 4);

        let names: Vec<&str> = suite
            .scenarios
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["api-root", "products", "categories", "user-wallet-flow"]
        );
    }

    #[test]
    fn test_wallet_flow_chains_on_user_uid() {
        let suite = builtin();
        let flow = &suite.scenarios[3];
        assert_eq!(flow.steps.len(), 5);

        assert!(flow.steps[0].requires.is_empty());
        assert!(flow.steps[0].save.contains_key("userUid"));
        for step in &flow.steps[1..] {
            assert_eq!(step.requires, vec!["userUid".to_string()]);
        }
    }

    #[test]
    fn test_generated_uids_are_unique_per_run() {
        let first = builtin();
        let second = builtin();

        let uid = |suite: &SuiteSpec| {
            suite.scenarios[3].steps[0]
                .request
                .body
                .as_ref()
                .unwrap()["uid"]
                .as_str()
                .unwrap()
                .to_string()
        };
        assert_ne!(uid(&first), uid(&second));
        assert!(uid(&first).starts_with("test_user_"));
    }

    #[test]
    fn test_categories_require_seeded_slugs() {
        let suite = builtin();
        let checks = &suite.scenarios[2].steps[0].checks;
        for slug in EXPECTED_CATEGORY_SLUGS {
            assert!(checks.contains(&CheckSpec::ListIncludes {
                field: "slug".to_string(),
                value: serde_json::json!(slug),
            }));
        }
    }

    #[test]
    fn test_listings_forbid_storage_internal_id() {
        let suite = builtin();
        for scenario in &suite.scenarios[1..3] {
            let checks = &scenario.steps[0].checks;
            assert!(checks.contains(&CheckSpec::ForbidField("_id".to_string())));
            assert!(checks.contains(&CheckSpec::NonEmptyList));
        }
    }
}
