//! Integration tests for server-driven component construction.

use std::sync::Arc;
use std::time::Instant;

use horizon_ux::prelude::*;
use horizon_ux::registry::{Component, QuerySourceProvider, UiComboBox, UiContext};
use parking_lot::Mutex;
use serde_json::{Value, json};

struct CitySources {
    requested: Mutex<Vec<String>>,
}

impl QuerySourceProvider for CitySources {
    fn query_source(&self, component_id: &str) -> Option<SharedQuerySource<Value>> {
        self.requested.lock().push(component_id.to_string());
        let cities = vec![
            json!({"displayValue": "Berlin", "country": "DE"}),
            json!({"displayValue": "Bern", "country": "CH"}),
            json!({"displayValue": "Paris", "country": "FR"}),
        ];
        Some(Arc::new(StaticQuerySource::new(cities, |v: &Value| {
            v["displayValue"].as_str().unwrap_or_default().to_string()
        })))
    }
}

fn setup() -> (ComponentRegistry, UiContext, Arc<CitySources>) {
    let registry = ComponentRegistry::new();
    register_builtin_components(&registry);
    let sources = Arc::new(CitySources {
        requested: Mutex::new(Vec::new()),
    });
    let context = UiContext::new(Arc::new(DetachedPositioning), sources.clone());
    (registry, context, sources)
}

fn combo_mut(component: &mut Box<dyn Component>) -> &mut ComboBox<Value> {
    component
        .as_any_mut()
        .downcast_mut::<UiComboBox>()
        .expect("component is a UiComboBox")
        .combo_box_mut()
}

#[test]
fn test_create_combo_box_from_server_config() {
    let (registry, context, sources) = setup();
    let mut component = registry
        .create(
            "UiComboBox",
            json!({
                "id": "city",
                "placeholderText": "City",
                "autoCompleteDelay": 0,
            }),
            &context,
        )
        .unwrap();

    assert_eq!(component.component_type(), UiComboBox::TYPE_NAME);
    assert_eq!(*sources.requested.lock(), vec!["city".to_string()]);

    let combo = combo_mut(&mut component);
    assert_eq!(combo.selected_entry_markup(), r#"<div class="placeholder-text">City</div>"#);

    combo.handle_focus_in();
    combo.handle_key_press(&KeyPressEvent::text("b"));
    combo.tick(Instant::now());
    assert_eq!(combo.editor_text(), "berlin");

    combo.handle_key_press(&KeyPressEvent::key(Key::ArrowDown));
    assert_eq!(combo.editor_text(), "Bern");
    combo.handle_key_press(&KeyPressEvent::key(Key::Enter));
    assert_eq!(combo.value(), Some(&json!({"displayValue": "Bern", "country": "CH"})));
}

#[test]
fn test_free_text_entries_from_server_config() {
    let (registry, context, _sources) = setup();
    let mut component = registry
        .create("UiComboBox", json!({"id": "city", "allowFreeText": true}), &context)
        .unwrap();

    let combo = combo_mut(&mut component);
    combo.handle_focus_in();
    for ch in ["Z", "u", "g"] {
        combo.handle_key_press(&KeyPressEvent::text(ch));
        combo.tick(Instant::now());
    }
    combo.handle_focus_out();

    assert_eq!(
        combo.value(),
        Some(&json!({"displayValue": "Zug", "_isFreeTextEntry": true}))
    );
    assert_eq!(combo.editor_text(), "Zug");
}

#[test]
fn test_custom_display_field() {
    let (registry, context, _sources) = setup();
    let component = registry
        .create(
            "UiComboBox",
            json!({
                "id": "country",
                "displayField": "country",
                "value": {"displayValue": "Paris", "country": "FR"},
            }),
            &context,
        )
        .unwrap();

    let combo = component.as_any().downcast_ref::<UiComboBox>().unwrap().combo_box();
    assert_eq!(combo.editor_text(), "FR");
}

#[test]
fn test_destroy_through_component() {
    let (registry, context, _sources) = setup();
    let mut component = registry
        .create("UiComboBox", json!({"id": "city"}), &context)
        .unwrap();

    component.destroy();
    assert!(combo_mut(&mut component).is_destroyed());
}

#[test]
fn test_host_components_can_nest_registry_calls() {
    let registry = Arc::new(ComponentRegistry::new());
    register_builtin_components(&registry);

    let inner = Arc::clone(&registry);
    registry.register("UiCityPicker", move |_config, context| {
        inner.create("UiComboBox", json!({"id": "nested"}), context)
    });

    let sources = Arc::new(CitySources {
        requested: Mutex::new(Vec::new()),
    });
    let context = UiContext::new(Arc::new(DetachedPositioning), sources);
    let component = registry.create("UiCityPicker", json!({}), &context).unwrap();
    assert_eq!(component.id(), "nested");
    assert_eq!(
        registry.names(),
        vec!["UiCityPicker".to_string(), "UiComboBox".to_string()]
    );
}

#[test]
fn test_error_messages() {
    let (registry, context, _sources) = setup();
    let err = registry
        .create("UiSlider", json!({}), &context)
        .err()
        .expect("unknown component type");
    assert_eq!(err.to_string(), "Unknown component type 'UiSlider'");

    let err = registry
        .create("UiComboBox", json!({"placeholderText": "no id"}), &context)
        .err()
        .expect("config without id");
    assert!(matches!(&err, Error::InvalidConfig { component, .. } if component == "UiComboBox"));
    assert!(std::error::Error::source(&err).is_some());
}
