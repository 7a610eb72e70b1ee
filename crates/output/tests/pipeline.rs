use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStatus};
use k8s_openapi::api::core::v1::{Pod, PodStatus, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kslim_core::OutputConfig;
use kslim_output::summary::{summarize, SummaryOptions};
use kslim_output::{extract_status, quick_process, to_record, to_records, Processor, REDACTED_VALUE};
use serde_json::{json, Value};

fn meta(name: &str, ns: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(ns.to_string()),
        uid: Some(format!("uid-{}", name)),
        resource_version: Some("1".into()),
        ..Default::default()
    }
}

fn deployment(name: &str, replicas: i32, ready: i32, available: i32) -> Deployment {
    Deployment {
        metadata: meta(name, "apps"),
        spec: Some(DeploymentSpec { replicas: Some(replicas), ..Default::default() }),
        status: Some(DeploymentStatus {
            ready_replicas: Some(ready),
            available_replicas: Some(available),
            ..Default::default()
        }),
    }
}

fn raw_pods(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| json!({"kind": "Pod", "apiVersion": "v1", "metadata": {"name": format!("p{}", i), "namespace": "ns"}}))
        .collect()
}

#[test]
fn typed_deployments_report_readiness() {
    let recs = to_records(&[deployment("full", 3, 3, 3), deployment("half", 3, 1, 1)]).unwrap();
    assert_eq!(recs[0]["kind"], json!("Deployment"));
    assert_eq!(extract_status(&recs[0]), "Ready");
    assert_eq!(extract_status(&recs[1]), "Partially Ready");

    let s = summarize(&recs, &SummaryOptions::default());
    assert_eq!(s.by_status.unwrap().get("Ready"), Some(&1));
    assert_eq!(s.sample, vec!["apps/full", "apps/half"]);
}

#[test]
fn typed_secret_is_masked_and_slimmed() {
    let secret = Secret {
        metadata: meta("db", "prod"),
        type_: Some("Opaque".into()),
        data: Some(BTreeMap::from([("password".to_string(), ByteString(b"hunter2".to_vec()))])),
        ..Default::default()
    };
    let rec = to_record(&secret).unwrap();
    let out = Processor::default().process_single(&rec);
    assert_eq!(out["data"]["password"], json!(REDACTED_VALUE));
    assert_eq!(out["type"], json!("Opaque"));
    assert!(out["metadata"].get("uid").is_none());
    assert!(out["metadata"].get("resourceVersion").is_none());
    assert_eq!(out["metadata"]["name"], json!("db"));
    assert!(!out.to_string().contains("aHVudGVyMg=="));
}

#[test]
fn typed_pod_phase() {
    let pod = Pod {
        metadata: meta("web-0", "default"),
        status: Some(PodStatus { phase: Some("Pending".into()), ..Default::default() }),
        ..Default::default()
    };
    assert_eq!(extract_status(&to_record(&pod).unwrap()), "Pending");
}

#[test]
fn hundred_fifty_records_truncate_to_hundred() {
    let r = Processor::new(OutputConfig::default()).process_with_limit(&raw_pods(150), 100);
    assert_eq!(r.items.len(), 100);
    assert!(r.metadata.truncated);
    assert_eq!(r.metadata.original_count, 150);
    assert_eq!(r.metadata.final_count, 100);
    assert_eq!(r.warnings.len(), 1);
    assert!(!r.warnings[0].suggest_summary);
}

#[test]
fn six_hundred_records_suggest_summary() {
    let r = quick_process(&raw_pods(600));
    assert_eq!(r.items.len(), 100);
    let w = &r.warnings[0];
    assert!(w.suggest_summary);
    assert_eq!((w.shown, w.total), (100, 600));
    assert!(Processor::default().should_suggest_summary(600));
}

#[test]
fn processing_never_mutates_input() {
    let input = vec![
        json!({"kind": "Secret", "metadata": {"name": "s", "uid": "x"}, "data": {"k": "v"}}),
        json!({"kind": "Pod", "metadata": {"name": "p", "managedFields": [{}]}}),
    ];
    let copy = input.clone();
    let _ = quick_process(&input);
    assert_eq!(input, copy);
}

#[test]
fn response_envelope_round_trip() {
    let r = Processor::new(OutputConfig { max_items: 2, ..Default::default() }).process(&raw_pods(3));
    let v = r.into_response();
    assert_eq!(v["_truncated"], json!(true));
    assert_eq!(v["_originalCount"], json!(3));
    assert_eq!(v["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(v["_warnings"].as_array().map(Vec::len), Some(1));
}
