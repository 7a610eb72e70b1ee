//! Secret redaction.
//!
//! A record is secret-bearing when its `kind` is `Secret` (any case). Payload values
//! under `data` and `stringData` are replaced with [`REDACTED_VALUE`], keys kept, so a
//! reader still sees which entries exist. `type` and the rest of the object pass
//! through untouched.

use kslim_core::{kind_of, object_at, str_at, Fields};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

pub const REDACTED_VALUE: &str = "***REDACTED***";

pub const PAYLOAD_FIELDS: &[&str] = &["data", "stringData"];

pub const SENSITIVE_ANNOTATIONS: &[&str] = &[
    "kubernetes.io/service-account.uid",
    "kubernetes.io/service-account.name",
    "kubernetes.io/service-account-token",
];

/// Secret types whose payload is always treated as sensitive.
pub const SENSITIVE_SECRET_TYPES: &[&str] = &[
    "kubernetes.io/service-account-token",
    "kubernetes.io/dockercfg",
    "kubernetes.io/dockerconfigjson",
    "kubernetes.io/basic-auth",
    "kubernetes.io/ssh-auth",
    "kubernetes.io/tls",
    "bootstrap.kubernetes.io/token",
    "helm.sh/release.v1",
    "Opaque",
];

/// ConfigMap name fragments that hint at credentials stored outside a Secret.
pub const SENSITIVE_CONFIGMAP_PATTERNS: &[&str] = &["credentials", "password", "secret", "auth", "token", "kubeconfig"];

static DEFAULT_MASKER: Lazy<SecretMasker> = Lazy::new(SecretMasker::default);

/// Which fields of a secret-bearing record get masked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretMasker {
    pub payload_fields: Vec<String>,
    pub annotations: Vec<String>,
}

impl Default for SecretMasker {
    fn default() -> Self {
        Self {
            payload_fields: PAYLOAD_FIELDS.iter().map(|s| s.to_string()).collect(),
            annotations: SENSITIVE_ANNOTATIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SecretMasker {
    /// Masked copy of `record`; non-secrets come back as plain copies.
    pub fn mask(&self, record: &Value) -> Value {
        let mut out = record.clone();
        self.mask_in_place(&mut out);
        out
    }

    pub fn mask_list(&self, records: &[Value]) -> Vec<Value> {
        records.iter().map(|r| self.mask(r)).collect()
    }

    /// Mask an owned record. Returns whether it was secret-bearing.
    pub fn mask_in_place(&self, record: &mut Value) -> bool {
        if !is_secret_resource(record) {
            return false;
        }
        let Some(obj) = record.as_object_mut() else { return false };
        for field in &self.payload_fields {
            if let Some(Value::Object(payload)) = obj.get_mut(field.as_str()) {
                redact_values(payload);
            }
        }
        if let Some(Value::Object(annos)) = obj.get_mut("metadata").and_then(|m| m.get_mut("annotations")) {
            for (k, v) in annos.iter_mut() {
                if self.annotations.iter().any(|a| a == k) {
                    *v = Value::String(REDACTED_VALUE.to_string());
                }
            }
        }
        true
    }
}

fn redact_values(m: &mut Fields) {
    for v in m.values_mut() {
        *v = Value::String(REDACTED_VALUE.to_string());
    }
}

pub fn mask_secrets(record: &Value) -> Value {
    DEFAULT_MASKER.mask(record)
}

pub fn mask_secrets_in_list(records: &[Value]) -> Vec<Value> {
    DEFAULT_MASKER.mask_list(records)
}

pub fn is_secret_resource(record: &Value) -> bool {
    kind_of(record).eq_ignore_ascii_case("Secret")
}

pub fn is_sensitive_secret_type(secret_type: &str) -> bool {
    SENSITIVE_SECRET_TYPES.contains(&secret_type)
}

/// Identity-only view of a Secret: kind, apiVersion, type, name/namespace/creation
/// time/labels, and the number of data keys. No payload keys or values.
pub fn secret_summary(secret: &Value) -> Value {
    if secret.is_null() {
        return Value::Null;
    }
    let mut out = Fields::new();
    for key in ["kind", "apiVersion"] {
        if let Some(s) = str_at(secret, &[key]) {
            out.insert(key.into(), json!(s));
        }
    }
    if let Some(meta) = object_at(secret, &["metadata"]) {
        let mut m = Fields::new();
        for key in ["name", "namespace", "creationTimestamp"] {
            if let Some(s) = meta.get(key).and_then(Value::as_str) {
                m.insert(key.into(), json!(s));
            }
        }
        if let Some(labels) = meta.get("labels").filter(|l| l.is_object()) {
            m.insert("labels".into(), labels.clone());
        }
        out.insert("metadata".into(), Value::Object(m));
    }
    if let Some(t) = str_at(secret, &["type"]) {
        out.insert("type".into(), json!(t));
    }
    if let Some(data) = object_at(secret, &["data"]) {
        out.insert("dataKeys".into(), json!(data.len()));
    }
    out.insert("_dataRedacted".into(), json!(true));
    Value::Object(out)
}

/// Whether a record may carry credentials: Secrets, ServiceAccounts, and ConfigMaps
/// whose name looks credential-like.
pub fn contains_sensitive_data(record: &Value) -> bool {
    match kind_of(record).to_ascii_lowercase().as_str() {
        "secret" | "serviceaccount" => true,
        "configmap" => str_at(record, &["metadata", "name"])
            .map(|n| {
                let n = n.to_ascii_lowercase();
                SENSITIVE_CONFIGMAP_PATTERNS.iter().any(|p| n.contains(p))
            })
            .unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "type": "kubernetes.io/service-account-token",
            "metadata": {
                "name": "sa-token",
                "namespace": "default",
                "creationTimestamp": "2024-01-01T00:00:00Z",
                "labels": {"app": "x"},
                "annotations": {
                    "kubernetes.io/service-account.name": "builder",
                    "kubernetes.io/service-account.uid": "1234",
                    "kubernetes.io/service-account-token": "eyJhbGciOi",
                    "team": "platform"
                }
            },
            "data": {"token": "c2VjcmV0", "ca.crt": "Y2E="},
            "stringData": {"password": "hunter2"}
        })
    }

    #[test]
    fn masks_payload_and_annotations() {
        let input = secret();
        let out = mask_secrets(&input);

        let mut expected = input.clone();
        expected["data"] = json!({"token": REDACTED_VALUE, "ca.crt": REDACTED_VALUE});
        expected["stringData"] = json!({"password": REDACTED_VALUE});
        let annos = &mut expected["metadata"]["annotations"];
        for key in SENSITIVE_ANNOTATIONS {
            annos[*key] = json!(REDACTED_VALUE);
        }
        assert_eq!(out, expected);
        assert_eq!(out["metadata"]["annotations"]["team"], json!("platform"));
        assert_eq!(out["metadata"]["annotations"]["kubernetes.io/service-account-token"], json!(REDACTED_VALUE));
        // input untouched
        assert_eq!(input["data"]["token"], json!("c2VjcmV0"));
        assert_eq!(input["metadata"]["annotations"]["kubernetes.io/service-account-token"], json!("eyJhbGciOi"));
    }

    #[test]
    fn kind_is_case_insensitive() {
        let out = mask_secrets(&json!({"kind": "secret", "data": {"k": "v"}}));
        assert_eq!(out["data"]["k"], json!(REDACTED_VALUE));
    }

    #[test]
    fn non_secrets_and_null_pass_through() {
        let cm = json!({"kind": "ConfigMap", "data": {"k": "v"}});
        assert_eq!(mask_secrets(&cm), cm);
        assert_eq!(mask_secrets(&Value::Null), Value::Null);
        let odd = json!({"kind": "Secret", "data": "not-a-map"});
        assert_eq!(mask_secrets(&odd), odd);
    }

    #[test]
    fn custom_payload_fields() {
        let masker = SecretMasker { payload_fields: vec!["data".into()], annotations: vec![] };
        let out = masker.mask(&secret());
        assert_eq!(out["stringData"]["password"], json!("hunter2"));
        assert_eq!(out["metadata"]["annotations"]["kubernetes.io/service-account.uid"], json!("1234"));
        assert_eq!(out["data"]["token"], json!(REDACTED_VALUE));
    }

    #[test]
    fn mask_list_keeps_order() {
        let list = vec![json!({"kind": "Pod"}), secret()];
        let out = mask_secrets_in_list(&list);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], list[0]);
        assert_eq!(out[1]["data"]["token"], json!(REDACTED_VALUE));
    }

    #[test]
    fn summary_has_no_payload() {
        let s = secret_summary(&secret());
        assert_eq!(s["dataKeys"], json!(2));
        assert_eq!(s["_dataRedacted"], json!(true));
        assert_eq!(s["type"], json!("kubernetes.io/service-account-token"));
        assert_eq!(s["metadata"], json!({
            "name": "sa-token",
            "namespace": "default",
            "creationTimestamp": "2024-01-01T00:00:00Z",
            "labels": {"app": "x"}
        }));
        assert!(s.get("data").is_none());
        assert!(s.get("stringData").is_none());
        assert!(!s.to_string().contains("c2VjcmV0"));
        assert_eq!(secret_summary(&Value::Null), Value::Null);
    }

    #[test]
    fn sensitivity_probe() {
        assert!(contains_sensitive_data(&json!({"kind": "Secret"})));
        assert!(contains_sensitive_data(&json!({"kind": "ServiceAccount"})));
        assert!(contains_sensitive_data(&json!({"kind": "ConfigMap", "metadata": {"name": "db-Credentials"}})));
        assert!(!contains_sensitive_data(&json!({"kind": "ConfigMap", "metadata": {"name": "nginx-conf"}})));
        assert!(!contains_sensitive_data(&json!({"kind": "ConfigMap"})));
        assert!(!contains_sensitive_data(&json!({"kind": "Pod"})));
        assert!(is_sensitive_secret_type("kubernetes.io/tls"));
        assert!(is_sensitive_secret_type("Opaque"));
        assert!(!is_sensitive_secret_type("example.com/custom"));
    }
}
