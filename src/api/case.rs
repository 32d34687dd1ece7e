//! Key-naming translation between the wire format (snake_case) and the
//! application format (camelCase).
//!
//! Only keys are rewritten; values pass through untouched, including `null`.

use serde_json::{Map, Value};

/// `created_at` -> `createdAt`.
///
/// An underscore followed by a letter or digit becomes that character uppercased.
/// Any other underscore is kept, so `__v` becomes `_V`.
pub fn to_app_key(key: &str) -> String {
  let mut out = String::with_capacity(key.len());
  let mut chars = key.chars().peekable();

  while let Some(c) = chars.next() {
    if c == '_' {
      if let Some(&next) = chars.peek() {
        if next.is_alphanumeric() {
          chars.next();
          out.extend(next.to_uppercase());
          continue;
        }
      }
    }
    out.push(c);
  }

  out
}

/// `createdAt` -> `created_at`.
///
/// Every uppercase letter becomes `_` plus its lowercase form, including a leading
/// one, so `Id` becomes `_id`.
pub fn to_wire_key(key: &str) -> String {
  let mut out = String::with_capacity(key.len() + 4);

  for c in key.chars() {
    if c.is_uppercase() {
      out.push('_');
      out.extend(c.to_lowercase());
    } else {
      out.push(c);
    }
  }

  out
}

/// Recursively rewrite every object key in `value` from wire to application format.
pub fn to_app(value: Value) -> Value {
  transform(value, &to_app_key)
}

/// Recursively rewrite every object key in `value` from application to wire format.
pub fn to_wire(value: Value) -> Value {
  transform(value, &to_wire_key)
}

fn transform(value: Value, rename: &dyn Fn(&str) -> String) -> Value {
  match value {
    Value::Array(items) => Value::Array(items.into_iter().map(|v| transform(v, rename)).collect()),
    Value::Object(map) => {
      let mut out = Map::with_capacity(map.len());
      for (key, value) in map {
        out.insert(rename(&key), transform(value, rename));
      }
      Value::Object(out)
    }
    scalar => scalar,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_app_keys() {
    assert_eq!(to_app_key("created_at"), "createdAt");
    assert_eq!(to_app_key("id"), "id");
    assert_eq!(to_app_key("responded_by_id"), "respondedById");
    assert_eq!(to_app_key("image_urls"), "imageUrls");
    assert_eq!(to_app_key("page_2"), "page2");
    assert_eq!(to_app_key("trailing_"), "trailing_");
    assert_eq!(to_app_key("_id"), "Id");
    assert_eq!(to_app_key("__v"), "_V");
    assert_eq!(to_app_key("a__b"), "a_B");
  }

  #[test]
  fn test_wire_keys() {
    assert_eq!(to_wire_key("createdAt"), "created_at");
    assert_eq!(to_wire_key("respondedById"), "responded_by_id");
    assert_eq!(to_wire_key("grantType"), "grant_type");
    assert_eq!(to_wire_key("Id"), "_id");
    assert_eq!(to_wire_key("_V"), "__v");
    assert_eq!(to_wire_key("pageNum"), "page_num");
    assert_eq!(to_wire_key("plain"), "plain");
  }

  #[test]
  fn test_nested_translation() {
    let wire = json!({
      "page_type": "log",
      "image_urls": [{ "file_name": "a.png", "id": 1 }],
      "more_info_url": null,
      "meta": { "page_count": 3, "page_size": 20 }
    });

    let app = to_app(wire);
    assert_eq!(
      app,
      json!({
        "pageType": "log",
        "imageUrls": [{ "fileName": "a.png", "id": 1 }],
        "moreInfoUrl": null,
        "meta": { "pageCount": 3, "pageSize": 20 }
      })
    );
  }

  #[test]
  fn test_values_are_not_rewritten() {
    let app = to_app(json!({ "sort": "created_at desc", "list": ["snake_case"] }));
    assert_eq!(app, json!({ "sort": "created_at desc", "list": ["snake_case"] }));
  }

  #[test]
  fn test_top_level_array() {
    let app = to_app(json!([{ "updated_at": "x" }, 3, null]));
    assert_eq!(app, json!([{ "updatedAt": "x" }, 3, null]));
  }

  #[test]
  fn test_round_trip_from_wire() {
    let wire = json!({
      "created_at": "2021-01-01",
      "responded_by_id": 4,
      "page": { "page_type": "month", "image_urls": [] },
      "a_1_b": true,
      "_id": 7,
      "__v": 0,
      "_destroy": false,
      "a__b": null,
      "months": [{ "animal_id": 1, "number": 2 }]
    });

    let app = to_app(wire);
    assert_eq!(to_app(to_wire(app.clone())), app);
  }

  #[test]
  fn test_underscored_keys_are_stable() {
    let app = to_app(json!({ "_id": 1, "__v": 2 }));
    assert_eq!(app, json!({ "Id": 1, "_V": 2 }));
    assert_eq!(to_wire(app.clone()), json!({ "_id": 1, "__v": 2 }));
    assert_eq!(to_app(to_wire(app.clone())), app);
  }

  #[test]
  fn test_round_trip_from_app() {
    let app = json!({
      "clientId": "abc",
      "grantType": "client_credentials",
      "question": { "askedBy": "Ann", "userID": 9 },
      "URL": "x",
      "Id": 3,
      "a_B": true
    });

    let wire = to_wire(app);
    assert_eq!(to_wire(to_app(wire.clone())), wire);
  }
}
