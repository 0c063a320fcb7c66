use std::{fs, ops::RangeInclusive, path::Path};

use cas_registry::{
    common::{
        attribute::AttributeMapping,
        descriptor::ServiceDescriptor,
        id::IdSource,
        input::{DescriptorInput, SamlServiceInput, ServiceInput},
        ValidationError,
    },
    Error, FsRegistry, ServiceRegistry,
};
use serde_json::Value;

struct Fixed(i64);

impl IdSource for Fixed {
    fn draw(&self, _: RangeInclusive<i64>) -> i64 {
        self.0
    }
}

fn service(id: Option<&str>) -> DescriptorInput {
    ServiceInput {
        service_id: "https://stamford.example.edu".to_string(),
        name: Some("stamford - SSO".to_string()),
        description: "Stamford prod".to_string(),
        allowed_attributes: vec!["netid".to_string(), "givenName".to_string()],
        evaluation_order_override: None,
        id: id.map(str::to_string),
    }
    .into()
}

fn saml(id: Option<&str>) -> DescriptorInput {
    SamlServiceInput {
        entity_id: "http://sso.example.com/shibboleth".to_string(),
        name: Some("Example SSO".to_string()),
        description: "Example SSO Service".to_string(),
        metadata_location: "/etc/cas/saml/sp-metadata.xml".to_string(),
        required_name_id_format: "urn:oasis:names:tc:SAML:2.0:nameid-format:unspecified"
            .to_string(),
        name_id_attribute: "uid".to_string(),
        attributes: [("uid", "netid"), ("email", "EmailAddress")]
            .into_iter()
            .collect::<AttributeMapping>(),
        evaluation_order_override: None,
        id: id.map(str::to_string),
    }
    .into()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn dir_listing(dir: &Path) -> Vec<(String, String)> {
    let mut listing: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            (name, fs::read_to_string(&path).unwrap_or_default())
        })
        .collect();
    listing.sort();
    listing
}

#[test_log::test]
fn distinct_ids_both_exist() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = FsRegistry::new(tmp.path());

    let first = registry.create(&service(Some("10000440"))).unwrap();
    let second = registry.create(&saml(Some("100001"))).unwrap();

    assert_eq!(first.path, tmp.path().join("service_10000440.json"));
    assert_eq!(second.path, tmp.path().join("service_100001.json"));
    assert_eq!(read_json(&first.path)["id"], "10000440");
    assert_eq!(read_json(&second.path)["id"], "100001");
    assert_eq!(
        first.to_string(),
        format!(
            "Service configuration 10000440 created at {}.",
            first.path.display()
        )
    );
}

#[test_log::test]
fn collision_fails_without_touching_anything() {
    let tmp = tempfile::tempdir().unwrap();
    // an existing descriptor under a non-canonical file name
    fs::write(
        tmp.path().join("legacy-app.json"),
        r#"{"@class": "org.apereo.cas.services.CasRegisteredService", "id": 4242}"#,
    )
    .unwrap();
    let before = dir_listing(tmp.path());

    let err = FsRegistry::new(tmp.path())
        .create(&saml(Some("4242")))
        .unwrap_err();

    match &err {
        Error::Collision { id, path } => {
            assert_eq!(id.as_str(), "4242");
            assert_eq!(path, &tmp.path().join("legacy-app.json"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(dir_listing(tmp.path()), before);
}

#[test_log::test]
fn second_create_with_same_id_collides() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = FsRegistry::new(tmp.path());

    let created = registry.create(&service(Some("2000"))).unwrap();
    let content = fs::read_to_string(&created.path).unwrap();

    assert!(matches!(
        registry.create(&saml(Some("2000"))),
        Err(Error::Collision { .. })
    ));
    assert_eq!(fs::read_to_string(&created.path).unwrap(), content);
}

#[test_log::test]
fn saml_release_structures() {
    let tmp = tempfile::tempdir().unwrap();
    let created = FsRegistry::new(tmp.path()).create(&saml(None)).unwrap();
    let json = read_json(&created.path);

    let formats = json["attributeNameFormats"].as_object().unwrap();
    assert_eq!(
        formats.iter().collect::<Vec<_>>(),
        vec![
            (&"@class".to_string(), &Value::from("java.util.HashMap")),
            (&"netid".to_string(), &Value::from("uri")),
            (&"EmailAddress".to_string(), &Value::from("uri")),
        ]
    );
    assert_eq!(
        json["attributeValueTypes"],
        serde_json::json!({
            "@class": "java.util.HashMap",
            "netid": "XSString",
            "EmailAddress": "XSString",
        })
    );
    assert_eq!(
        json["attributeReleasePolicy"]["allowedAttributes"],
        serde_json::json!(["java.util.ArrayList", ["uid", "email"]])
    );
    assert_eq!(
        json["usernameAttributeProvider"]["usernameAttribute"],
        "uid"
    );
}

#[test_log::test]
fn evaluation_order_equals_id() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = FsRegistry::new(tmp.path());

    for input in [service(None), saml(Some("100002")), service(Some("31337"))] {
        let created = registry.create(&input).unwrap();
        let json = read_json(&created.path);
        let id: i64 = json["id"].as_str().unwrap().parse().unwrap();
        assert_eq!(json["evaluationOrder"].as_i64(), Some(id));
    }
}

#[test_log::test]
fn argument_evaluation_order_does_not_override_id() {
    let tmp = tempfile::tempdir().unwrap();
    let input = ServiceInput::from_args(&serde_json::json!({
        "entityID": "https://stamford.example.edu",
        "service_id": "10000440",
        "service_description": "Stamford prod",
        "evaluationOrder": 1,
    }))
    .unwrap();

    let created = FsRegistry::new(tmp.path()).create(&input.into()).unwrap();
    let json = read_json(&created.path);
    assert_eq!(json["id"], "10000440");
    assert_eq!(json["evaluationOrder"].as_i64(), Some(10000440));
}

#[test_log::test]
fn explicit_override_sets_evaluation_order() {
    let tmp = tempfile::tempdir().unwrap();
    let input = ServiceInput {
        service_id: "https://stamford.example.edu".to_string(),
        description: "Stamford prod".to_string(),
        evaluation_order_override: Some(5),
        id: Some("4000".to_string()),
        ..Default::default()
    };

    let created = FsRegistry::new(tmp.path()).create(&input.into()).unwrap();
    assert_eq!(read_json(&created.path)["evaluationOrder"].as_i64(), Some(5));
}

#[test_log::test]
fn round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = FsRegistry::new(tmp.path());

    for input in [service(Some("1500")), saml(Some("1501"))] {
        let created = registry.create(&input).unwrap();
        let expected =
            cas_registry::common::descriptor::build(&input, created.id.clone()).unwrap();

        let parsed =
            ServiceDescriptor::from_json(&fs::read_to_string(&created.path).unwrap()).unwrap();
        assert_eq!(parsed, expected);
    }
}

#[test_log::test]
fn garbage_in_registry_is_ignored() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("notes.txt"), "id: 1234, not json").unwrap();
    fs::write(tmp.path().join("half.json"), r#"{"id": "1234""#).unwrap();

    let created = FsRegistry::new(tmp.path())
        .create(&service(Some("1234")))
        .unwrap();
    assert_eq!(read_json(&created.path)["id"], "1234");
}

#[test_log::test]
fn missing_registry_is_created() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("etc/cas/services");

    let created = cas_registry::create(&dir, &service(None)).unwrap();
    assert!(created.path.starts_with(&dir));
    assert!(dir.is_dir());
}

#[test_log::test]
fn registry_path_is_a_file() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("services");
    fs::write(&file, "").unwrap();

    let err = FsRegistry::new(&file).create(&service(None)).unwrap_err();
    assert!(matches!(&err, Error::NotADirectory(path) if path == &file));
    assert_eq!(
        err.to_string(),
        format!("{} exists but is not a directory.", file.display())
    );
}

#[test_log::test]
fn validation_happens_before_the_filesystem() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("services");

    let err = FsRegistry::new(&dir)
        .create(&service(Some("12ab")))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::InvalidId(_))
    ));
    assert!(!dir.exists());
}

#[test_log::test]
fn synthesized_ids_come_from_the_configured_source() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = FsRegistry::builder(tmp.path())
        .with_id_source(Fixed(5555))
        .with_file_prefix("svc-")
        .build()
        .unwrap();

    let created = registry.create(&service(None)).unwrap();
    assert_eq!(created.id.as_str(), "5555");
    assert_eq!(created.path, tmp.path().join("svc-5555.json"));

    // no retry: the next draw yields the same id and collides
    assert!(matches!(
        registry.create(&service(None)),
        Err(Error::Collision { .. })
    ));
}

#[test_log::test]
fn builder_rejects_bad_configuration() {
    assert!(FsRegistry::builder("/tmp").with_id_range(9..=1).build().is_err());
    assert!(FsRegistry::builder("/tmp")
        .with_file_prefix("../evil")
        .build()
        .is_err());
}

#[test_log::test]
fn entries_and_remove_service() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = FsRegistry::new(tmp.path());
    registry.create(&service(Some("1001"))).unwrap();
    registry.create(&saml(Some("1002"))).unwrap();

    let ids: Vec<_> = registry
        .entries()
        .unwrap()
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(ids, ["1001", "1002"]);

    let removed = registry
        .remove_service(&"1001".parse().unwrap())
        .unwrap();
    assert!(removed.changed());
    assert_eq!(registry.entries().unwrap().len(), 1);
}
