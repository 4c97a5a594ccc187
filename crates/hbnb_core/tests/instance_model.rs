use hbnb_core::{AttrValue, Instance, ModelError, ModelKind};
use std::collections::BTreeMap;

#[test]
fn new_instance_sets_id_and_equal_timestamps() {
    let instance = Instance::new(ModelKind::User);

    assert_eq!(instance.id().len(), 36);
    assert_eq!(instance.kind(), ModelKind::User);
    assert_eq!(instance.created_at(), instance.updated_at());
    assert!(instance.attributes().is_empty());
    assert_eq!(instance.key(), format!("User.{}", instance.id()));
}

#[test]
fn ids_are_unique_across_kinds() {
    let a = Instance::new(ModelKind::User);
    let b = Instance::new(ModelKind::Place);
    assert_ne!(a.id(), b.id());
}

#[test]
fn get_falls_back_to_declared_default() {
    let mut place = Instance::new(ModelKind::Place);
    assert_eq!(place.get("number_rooms"), Some(AttrValue::Int(0)));
    assert_eq!(place.get("latitude"), Some(AttrValue::Float(0.0)));
    assert_eq!(place.get("amenity_ids"), Some(AttrValue::List(Vec::new())));
    assert_eq!(place.get("undeclared"), None);

    place.assign("number_rooms", AttrValue::from("3")).expect("numeric text should coerce");
    assert_eq!(place.get("number_rooms"), Some(AttrValue::Int(3)));
}

#[test]
fn to_dict_uses_expected_wire_fields() {
    let mut user = Instance::new(ModelKind::User);
    user.assign("email", AttrValue::from("a@b.com")).expect("email should be accepted");
    user.assign("age", AttrValue::Int(30)).expect("undeclared attribute should be accepted");

    let json = serde_json::to_value(user.to_dict()).expect("dict should serialize");
    assert_eq!(json["__class__"], "User");
    assert_eq!(json["id"], user.id());
    assert_eq!(json["email"], "a@b.com");
    assert_eq!(json["age"], 30);

    let created_at = json["created_at"].as_str().expect("timestamp should be a string");
    assert_eq!(created_at.len(), "2017-09-28T21:05:54.119427".len());
    assert_eq!(&created_at[10..11], "T");
}

#[test]
fn from_fields_roundtrips_to_dict() {
    let mut review = Instance::new(ModelKind::Review);
    review.assign("text", AttrValue::from("Great stay")).expect("text should be accepted");
    review
        .assign(
            "tags",
            AttrValue::List(vec![AttrValue::from("quiet"), AttrValue::Float(4.5)]),
        )
        .expect("undeclared list should be accepted");
    review.touch();

    let rebuilt = Instance::from_fields(ModelKind::Review, &review.to_dict())
        .expect("dict should rebuild the instance");
    assert_eq!(rebuilt, review);
}

#[test]
fn from_fields_accepts_persisted_python_style_record() {
    let fields: BTreeMap<String, AttrValue> = serde_json::from_value(serde_json::json!({
        "id": "56d43177-cc5f-4d6c-a0c1-e167f8c27337",
        "created_at": "2017-09-28T21:03:54.052298",
        "updated_at": "2017-09-28T21:03:54.052302",
        "__class__": "BaseModel",
        "my_number": 89,
        "name": "My First Model"
    }))
    .expect("fixture should decode");

    let instance = Instance::from_fields(ModelKind::BaseModel, &fields)
        .expect("fields should rebuild the instance");
    assert_eq!(instance.id(), "56d43177-cc5f-4d6c-a0c1-e167f8c27337");
    assert_eq!(instance.attributes().len(), 2);
    assert_eq!(instance.get("my_number"), Some(AttrValue::Int(89)));
    assert!(!instance.attributes().contains_key("__class__"));
}

#[test]
fn from_fields_rejects_bad_timestamp() {
    let mut fields = Instance::new(ModelKind::State).to_dict();
    fields.insert("created_at".to_string(), AttrValue::from("yesterday"));

    let err = Instance::from_fields(ModelKind::State, &fields)
        .expect_err("bad timestamp should be rejected");
    assert!(matches!(
        err,
        ModelError::InvalidField {
            field: "created_at",
            ..
        }
    ));
}

#[test]
fn display_renders_kind_id_and_mapping() {
    let mut city = Instance::new(ModelKind::City);
    city.assign("name", AttrValue::from("San Francisco")).expect("name should be accepted");

    let rendered = city.to_string();
    let prefix = format!("[City] ({}) {{'id': '{}', 'created_at': '", city.id(), city.id());
    assert!(rendered.starts_with(&prefix), "unexpected: {rendered}");
    assert!(rendered.ends_with(", 'name': 'San Francisco'}"));
}

#[test]
fn assign_reports_coercion_failure_without_mutation() {
    let mut place = Instance::new(ModelKind::Place);
    let diagnostic = place
        .assign("latitude", AttrValue::from("north"))
        .expect_err("non-numeric latitude should be rejected");
    assert_eq!(diagnostic.name, "latitude");
    assert!(place.attributes().is_empty());
}
