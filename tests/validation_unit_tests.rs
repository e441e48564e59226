//! Unit tests for job validation

use prow_config::config::validation::{validate_agent, validate_decoration, validate_job_base, validate_labels};
use prow_config::config::{
    Container, DecorationConfig, GcsConfiguration, JobBase, JobType, Namespace, PodSpec, UtilityImages,
};
use std::collections::BTreeMap;

const POD_NAMESPACE: &str = "default";

fn pod_job() -> JobBase {
    JobBase {
        name: "job".to_owned(),
        agent: "tekton".to_owned(),
        namespace: Namespace::named(POD_NAMESPACE),
        cluster: "default".to_owned(),
        spec: Some(PodSpec {
            containers: vec![Container {
                image: "alpine".to_owned(),
                command: vec!["run".to_owned()],
                ..Container::default()
            }],
        }),
        ..JobBase::default()
    }
}

fn valid_decoration() -> DecorationConfig {
    DecorationConfig {
        utility_images: Some(UtilityImages {
            clonerefs: "clonerefs".to_owned(),
            initupload: "initupload".to_owned(),
            entrypoint: "entrypoint".to_owned(),
            sidecar: "sidecar".to_owned(),
        }),
        gcs_configuration: Some(GcsConfiguration {
            bucket: "bucket".to_owned(),
            path_strategy: "single".to_owned(),
            ..GcsConfiguration::default()
        }),
        gcs_credentials_secret: "credentials".to_owned(),
        ..DecorationConfig::default()
    }
}

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

#[test]
fn test_validate_agent() {
    assert!(validate_agent(&pod_job(), POD_NAMESPACE).is_ok());

    let unknown = JobBase {
        agent: "jenkins".to_owned(),
        ..pod_job()
    };
    assert!(validate_agent(&unknown, POD_NAMESPACE).is_err());

    let no_spec = JobBase {
        spec: None,
        ..pod_job()
    };
    assert!(validate_agent(&no_spec, POD_NAMESPACE).is_err());

    let undefaulted = JobBase {
        namespace: Namespace::Unset,
        ..pod_job()
    };
    assert!(validate_agent(&undefaulted, POD_NAMESPACE).is_err());

    let custom_namespace = JobBase {
        namespace: Namespace::named("elsewhere"),
        ..pod_job()
    };
    assert!(validate_agent(&custom_namespace, POD_NAMESPACE).is_err());
}

#[test]
fn test_validate_agent_legacy_build() {
    let without_build_spec = JobBase {
        agent: "knative-build".to_owned(),
        spec: None,
        ..pod_job()
    };
    assert!(validate_agent(&without_build_spec, POD_NAMESPACE).is_err());

    let with_build_spec = JobBase {
        build_spec: Some(serde_yaml::Value::Mapping(serde_yaml::Mapping::new())),
        namespace: Namespace::named("builds"),
        ..without_build_spec
    };
    assert!(validate_agent(&with_build_spec, POD_NAMESPACE).is_ok());
}

#[test]
fn test_validate_decoration() {
    let with_command = Container {
        command: vec!["run".to_owned()],
        ..Container::default()
    };
    let with_args = Container {
        args: vec!["test".to_owned()],
        ..Container::default()
    };
    let bare = Container::default();

    assert!(validate_decoration(&bare, None).is_ok());
    assert!(validate_decoration(&with_command, Some(&valid_decoration())).is_ok());
    assert!(validate_decoration(&with_args, Some(&valid_decoration())).is_ok());
    assert!(validate_decoration(&with_command, Some(&DecorationConfig::default())).is_err());
    assert!(validate_decoration(&bare, Some(&valid_decoration())).is_err());
}

#[test]
fn test_decoration_config_validation() {
    let mut missing_sidecar = valid_decoration();
    if let Some(images) = missing_sidecar.utility_images.as_mut() {
        images.sidecar.clear();
    }
    assert!(missing_sidecar.validate().is_err());

    let mut explicit_without_repo = valid_decoration();
    if let Some(gcs) = explicit_without_repo.gcs_configuration.as_mut() {
        "explicit".clone_into(&mut gcs.path_strategy);
        "org".clone_into(&mut gcs.default_org);
    }
    assert!(explicit_without_repo.validate().is_err());

    let mut unknown_strategy = valid_decoration();
    if let Some(gcs) = unknown_strategy.gcs_configuration.as_mut() {
        "nested".clone_into(&mut gcs.path_strategy);
    }
    assert!(unknown_strategy.validate().is_err());

    let no_secret = DecorationConfig {
        gcs_credentials_secret: String::new(),
        ..valid_decoration()
    };
    assert!(no_secret.validate().is_err());
}

#[test]
fn test_validate_labels() {
    assert!(validate_labels(&labels(&[("example.com/name", "value"), ("plain", "")])).is_ok());

    // Reserved
    assert!(validate_labels(&labels(&[("created-by-prow", "true")])).is_err());
    assert!(validate_labels(&labels(&[("prow.k8s.io/job", "x")])).is_err());

    // Bad keys
    assert!(validate_labels(&labels(&[("_underscore", "x")])).is_err());
    assert!(validate_labels(&labels(&[("Bad_Prefix!/name", "x")])).is_err());
    assert!(validate_labels(&labels(&[("k".repeat(64).as_str(), "x")])).is_err());

    // Bad values
    assert!(validate_labels(&labels(&[("key", "_underscore")])).is_err());
    assert!(validate_labels(&labels(&[("key", "trailing-")])).is_err());
    assert!(validate_labels(&labels(&[("key", "v".repeat(64).as_str())])).is_err());
}

#[test]
fn test_validate_job_base() {
    assert!(validate_job_base(&pod_job(), JobType::Periodic, POD_NAMESPACE).is_ok());

    let negative = JobBase {
        max_concurrency: -1,
        ..pod_job()
    };
    let err = validate_job_base(&negative, JobType::Periodic, POD_NAMESPACE).unwrap_err();
    assert!(err.to_string().contains("max_concurrency"), "{err}");

    let two_containers = JobBase {
        spec: Some(PodSpec {
            containers: vec![Container::default(), Container::default()],
        }),
        ..pod_job()
    };
    assert!(validate_job_base(&two_containers, JobType::Presubmit, POD_NAMESPACE).is_err());

    let mut decorated = pod_job();
    decorated.utility_config.decorate = true;
    assert!(validate_job_base(&decorated, JobType::Postsubmit, POD_NAMESPACE).is_err());

    decorated.utility_config.decoration_config = Some(valid_decoration());
    assert!(validate_job_base(&decorated, JobType::Postsubmit, POD_NAMESPACE).is_ok());

    // A decoration config is checked even when decoration is off
    let mut undecorated = pod_job();
    if let Some(container) = undecorated.primary_container_mut() {
        container.command.clear();
    }
    undecorated.utility_config.decoration_config = Some(DecorationConfig::default());
    let err = validate_job_base(&undecorated, JobType::Periodic, POD_NAMESPACE).unwrap_err();
    assert!(err.to_string().contains("invalid decoration config"), "{err}");
}
