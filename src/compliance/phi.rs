use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::RiskLevel;
use crate::reference::compliance::CompliancePolicy;
use crate::reference::ReferenceData;

use super::types::{
    ComplianceError, MinimizationReport, PhiFinding, PhiScanResult, QuasiIdentifierRisk,
};

/// Recursion ceiling for arbitrary records; deeper input is rejected as
/// unscannable rather than risking a stack overflow.
const MAX_SCAN_DEPTH: usize = 64;

/// Joint re-identification probabilities when quasi-identifier classes
/// combine. A single class on its own carries no combination risk.
const QUASI_PAIR_PROBABILITY: f64 = 0.15;
const QUASI_TRIO_PROBABILITY: f64 = 0.35;

// Content patterns for identifiers embedded in free text. Dates only count
// as dates of birth when birth context precedes them; bare dates are
// operational data.
static SSN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\(\d{3}\) ?|\b\d{3}[-. ])\d{3}[-. ]\d{4}\b").unwrap()
});
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});
static DOB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:dob|date of birth|born(?: on)?)\b[:, ]*\s*((?:19|20)\d{2}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/(?:19|20)\d{2})",
    )
    .unwrap()
});
static MRN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bMRN[:# ]\s*\d{5,10}\b").unwrap());
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Mr\.?|Mrs\.?|Ms\.?|Dr\.?|Patient) [A-Z][a-z]+(?: [A-Z][a-z]+)?").unwrap()
});

// Field names that hold identifiers directly. Exact matches on the
// lowercased key; substring matching would flag operational fields like
// `medication_name`.
const SSN_FIELDS: [&str; 3] = ["ssn", "social_security_number", "social_security"];
const NAME_FIELDS: [&str; 6] = [
    "name",
    "first_name",
    "last_name",
    "full_name",
    "patient_name",
    "maiden_name",
];
const DOB_FIELDS: [&str; 4] = ["dob", "date_of_birth", "birth_date", "birthdate"];
const MRN_FIELDS: [&str; 2] = ["mrn", "medical_record_number"];
const PHONE_FIELDS: [&str; 5] = ["phone", "phone_number", "mobile", "home_phone", "cell_phone"];
const EMAIL_FIELDS: [&str; 2] = ["email", "email_address"];
const ADDRESS_FIELDS: [&str; 3] = ["address", "street_address", "home_address"];

// Individually harmless fields that jointly re-identify.
const ZIP_FIELDS: [&str; 3] = ["zip", "zip_code", "postal_code"];
const AGE_FIELDS: [&str; 2] = ["age", "age_years"];
const CONDITION_FIELDS: [&str; 5] = [
    "condition",
    "conditions",
    "diagnosis",
    "diagnoses",
    "primary_diagnosis",
];

/// Scan an arbitrary record for protected health information: identifier
/// field names, identifier patterns inside free text, and quasi-identifier
/// combinations. Non-PHI content passes clean; only input too deep to walk
/// is an error.
pub fn scan_for_phi(
    record: &Value,
    reference: &ReferenceData,
) -> Result<PhiScanResult, ComplianceError> {
    let mut ctx = ScanContext {
        policy: &reference.compliance,
        findings: Vec::new(),
        zip_seen: false,
        age_seen: false,
        rare_condition_seen: false,
    };
    walk(record, "$", 0, &mut ctx)?;

    let mut findings = ctx.findings;
    findings.sort_by(|a, b| b.risk.cmp(&a.risk));
    let mut seen = HashSet::new();
    findings.retain(|f| seen.insert((f.category.clone(), f.location.clone())));

    let mut quasi_fields: Vec<&'static str> = Vec::new();
    if ctx.zip_seen {
        quasi_fields.push("zip_code");
    }
    if ctx.age_seen {
        quasi_fields.push("age");
    }
    if ctx.rare_condition_seen {
        quasi_fields.push("rare_condition");
    }
    let reidentification_probability = match quasi_fields.len() {
        3 => QUASI_TRIO_PROBABILITY,
        2 => QUASI_PAIR_PROBABILITY,
        _ => 0.0,
    };
    let additional_de_identification_required =
        reidentification_probability > ctx.policy.reidentification_threshold;
    let quasi_identifiers = (quasi_fields.len() >= 2).then(|| QuasiIdentifierRisk {
        fields: quasi_fields,
        risk: if additional_de_identification_required {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        },
        reidentification_probability,
        recommendation: "generalize_or_suppress_quasi_identifiers",
    });

    let contains_phi = !findings.is_empty();
    let safe_for_logging = !contains_phi && !additional_de_identification_required;
    let safe_for_analytics = !contains_phi && quasi_identifiers.is_none();

    if findings.iter().any(|f| f.risk == RiskLevel::Critical) {
        warn!(
            findings = findings.len(),
            "critical identifiers present in scanned record"
        );
    } else {
        debug!(
            findings = findings.len(),
            reidentification = reidentification_probability,
            "record scanned"
        );
    }

    Ok(PhiScanResult {
        contains_phi,
        findings,
        quasi_identifiers,
        reidentification_probability,
        additional_de_identification_required,
        safe_for_logging,
        safe_for_analytics,
    })
}

/// Report payload fields the declared purpose does not need. An unknown
/// purpose has no allow-list, so everything is flagged.
pub fn validate_data_minimization(
    record: &Value,
    purpose: &str,
    reference: &ReferenceData,
) -> MinimizationReport {
    let allowed = reference
        .compliance
        .allowed_fields_for(purpose)
        .unwrap_or(&[]);

    let mut present = Vec::new();
    collect_leaf_fields(record, 0, &mut present);

    let mut unnecessary: Vec<String> = Vec::new();
    for field in present {
        let needed = allowed.iter().any(|a| a.eq_ignore_ascii_case(&field));
        if !needed && !unnecessary.contains(&field) {
            unnecessary.push(field);
        }
    }

    let minimal = unnecessary.is_empty();
    let recommendation = (!minimal).then(|| {
        format!(
            "Remove fields not required for {purpose}: {}",
            unnecessary.join(", ")
        )
    });
    MinimizationReport {
        purpose: purpose.to_string(),
        unnecessary_fields: unnecessary,
        minimal,
        recommendation,
    }
}

// ---------------------------------------------------------------------------
// [1] Record walk
// ---------------------------------------------------------------------------

struct ScanContext<'a> {
    policy: &'a CompliancePolicy,
    findings: Vec<PhiFinding>,
    zip_seen: bool,
    age_seen: bool,
    rare_condition_seen: bool,
}

fn walk(
    value: &Value,
    path: &str,
    depth: usize,
    ctx: &mut ScanContext,
) -> Result<(), ComplianceError> {
    if depth > MAX_SCAN_DEPTH {
        return Err(ComplianceError::Unscannable {
            reason: format!("nesting depth exceeds {MAX_SCAN_DEPTH} levels"),
        });
    }
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = format!("{path}.{key}");
                inspect_field(key, child, &child_path, ctx);
                walk(child, &child_path, depth + 1, ctx)?;
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                walk(item, &format!("{path}[{index}]"), depth + 1, ctx)?;
            }
        }
        Value::String(text) => scan_prose(text, path, &mut ctx.findings),
        _ => {}
    }
    Ok(())
}

fn inspect_field(key: &str, value: &Value, path: &str, ctx: &mut ScanContext) {
    let key_lower = key.to_ascii_lowercase();
    let key_lower = key_lower.as_str();

    if let Some((category, risk)) = identifier_class(key_lower) {
        if let Some(rendered) = scalar_text(value) {
            ctx.findings.push(PhiFinding {
                category: category.to_string(),
                risk,
                location: path.to_string(),
                excerpt: redact(&rendered),
            });
        }
    }

    if ZIP_FIELDS.contains(&key_lower) && !value.is_null() {
        ctx.zip_seen = true;
    }
    if AGE_FIELDS.contains(&key_lower) && !value.is_null() {
        ctx.age_seen = true;
    }
    if CONDITION_FIELDS.contains(&key_lower) {
        let rare = match value {
            Value::String(condition) => ctx.policy.is_rare_condition(condition),
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .any(|condition| ctx.policy.is_rare_condition(condition)),
            _ => false,
        };
        if rare {
            ctx.rare_condition_seen = true;
        }
    }
}

fn identifier_class(key_lower: &str) -> Option<(&'static str, RiskLevel)> {
    if SSN_FIELDS.contains(&key_lower) {
        Some(("ssn", RiskLevel::Critical))
    } else if NAME_FIELDS.contains(&key_lower) {
        Some(("person_name", RiskLevel::High))
    } else if DOB_FIELDS.contains(&key_lower) {
        Some(("date_of_birth", RiskLevel::High))
    } else if MRN_FIELDS.contains(&key_lower) {
        Some(("medical_record_number", RiskLevel::High))
    } else if PHONE_FIELDS.contains(&key_lower) {
        Some(("phone", RiskLevel::Medium))
    } else if EMAIL_FIELDS.contains(&key_lower) {
        Some(("email", RiskLevel::Medium))
    } else if ADDRESS_FIELDS.contains(&key_lower) {
        Some(("address", RiskLevel::Medium))
    } else {
        None
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// [2] Free-text patterns
// ---------------------------------------------------------------------------

fn scan_prose(text: &str, path: &str, findings: &mut Vec<PhiFinding>) {
    push_matches(&SSN_RE, "ssn", RiskLevel::Critical, text, path, findings);
    push_matches(&NAME_RE, "person_name", RiskLevel::High, text, path, findings);
    push_matches(
        &MRN_RE,
        "medical_record_number",
        RiskLevel::High,
        text,
        path,
        findings,
    );
    push_matches(&PHONE_RE, "phone", RiskLevel::Medium, text, path, findings);
    push_matches(&EMAIL_RE, "email", RiskLevel::Medium, text, path, findings);

    // Birth context is captured separately from the date itself.
    for capture in DOB_RE.captures_iter(text) {
        if let Some(date) = capture.get(1) {
            findings.push(PhiFinding {
                category: "date_of_birth".to_string(),
                risk: RiskLevel::High,
                location: path.to_string(),
                excerpt: redact(date.as_str()),
            });
        }
    }
}

fn push_matches(
    re: &Regex,
    category: &str,
    risk: RiskLevel,
    text: &str,
    path: &str,
    findings: &mut Vec<PhiFinding>,
) {
    for matched in re.find_iter(text) {
        findings.push(PhiFinding {
            category: category.to_string(),
            risk,
            location: path.to_string(),
            excerpt: redact(matched.as_str()),
        });
    }
}

/// Keep only the last four characters so findings stay loggable.
fn redact(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 4 {
        "****".to_string()
    } else {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("***{tail}")
    }
}

fn collect_leaf_fields(value: &Value, depth: usize, out: &mut Vec<String>) {
    if depth > MAX_SCAN_DEPTH {
        return;
    }
    if let Value::Object(map) = value {
        for (key, child) in map {
            match child {
                Value::Object(_) => collect_leaf_fields(child, depth + 1, out),
                Value::Array(items) if items.iter().any(|i| i.is_object()) => {
                    for item in items {
                        collect_leaf_fields(item, depth + 1, out);
                    }
                }
                _ => out.push(key.clone()),
            }
        }
    }
}
