mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{controller, copied, noop, recorder, selected, BASE};
use picker_embed::{
    ActivateOptions, Container, IntegrationId, IntegrationKind, MediaCallback, MediaEvent,
    Position, Routed,
};
use serde_json::json;
use tracing_test::traced_test;

#[test]
fn overlay_selection_calls_back_once_and_closes_the_overlay() {
    let ctl = controller();
    let (callback, events) = recorder();
    ctl.activate(ActivateOptions::overlay(callback)).unwrap();

    assert_eq!(ctl.handle_message(BASE, &selected(0, 42)), Routed::Handled);

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, IntegrationId::Overlay);
    assert_eq!(events[0].kind, IntegrationKind::Overlay);
    assert_eq!(events[0].media.id(), Some(42));
    assert_eq!(events[0].media.cache_url(), Some("https://cdn.example.org/42.gif"));
    let overlay = ctl.overlay_element().unwrap();
    assert_eq!(overlay.style("display").as_deref(), Some("none"));
    assert!(!ctl.is_active(IntegrationId::Overlay));
}

#[test]
fn modal_selection_closes_the_modal() {
    let ctl = controller();
    let (callback, events) = recorder();
    ctl.activate(ActivateOptions::modal(Position::new(0.0, 0.0), callback))
        .unwrap();
    ctl.handle_message(BASE, &selected(1, 5));
    assert_eq!(events.borrow().len(), 1);
    let modal = ctl.modal_element().unwrap();
    assert_eq!(modal.style("pointer-events").as_deref(), Some("none"));
}

#[test]
fn frame_selection_calls_back_and_keeps_the_frame() {
    let ctl = controller();
    let host = ctl.dom().add_div("picker");
    let (callback, events) = recorder();
    let id = ctl
        .activate(ActivateOptions::iframe(Container::Element(host.clone()), callback))
        .unwrap();

    ctl.handle_message(BASE, &selected(id.as_u32(), 9));
    ctl.handle_message(BASE, &selected(id.as_u32(), 10));

    assert_eq!(events.borrow().len(), 2);
    assert_eq!(events.borrow()[1].kind, IntegrationKind::Iframe);
    assert!(host.iframe().is_some());
    assert!(ctl.is_active(id));
}

#[test]
#[traced_test]
fn untrusted_origin_never_reaches_callbacks() {
    let ctl = controller();
    let (callback, events) = recorder();
    ctl.activate(ActivateOptions::overlay(callback)).unwrap();

    for origin in [
        "https://evil.example.org",
        "http://picker.example.org",
        "https://picker.example.org:8443",
        "https://picker.example.org.evil.example",
        "null",
    ] {
        assert_eq!(ctl.handle_message(origin, &selected(0, 1)), Routed::Untrusted);
        assert_eq!(
            ctl.handle_message(origin, &json!({"type": "picker:closed", "id": 0})),
            Routed::Untrusted
        );
    }
    assert!(events.borrow().is_empty());
    assert!(ctl.is_active(IntegrationId::Overlay));
    assert!(logs_contain("untrusted origin"));
}

#[test]
fn irregular_media_from_the_picker_still_reaches_the_callback() {
    let ctl = controller();
    let (callback, events) = recorder();
    let irregular = [
        json!({"id": 7, "created_at": null, "score": 1.5}),
        json!({"id": "7", "cache_url": "https://cdn.example.org/7.gif", "category": ["a"]}),
        json!({"slug": 12, "is_deleted": "maybe", "user_id": -3}),
        json!("https://cdn.example.org/raw.gif"),
    ];
    for media in &irregular {
        ctl.activate(ActivateOptions::overlay(callback.clone())).unwrap();
        let message = json!({"type": "picker:media-selected", "id": 0, "media": media});
        assert_eq!(ctl.handle_message(BASE, &message), Routed::Handled);
    }

    let events = events.borrow();
    assert_eq!(events.len(), irregular.len());
    for (event, media) in events.iter().zip(&irregular) {
        assert_eq!(event.media.as_value(), media);
    }
    assert_eq!(events[0].media.id(), Some(7));
    assert_eq!(events[1].media.id(), Some(7));
    assert_eq!(events[2].media.id(), None);
}

#[test]
fn foreign_messages_are_ignored_even_from_the_picker_origin() {
    let ctl = controller();
    let (callback, events) = recorder();
    ctl.activate(ActivateOptions::overlay(callback)).unwrap();

    for data in [
        json!({"id": 0, "media": {}}),
        json!({"type": 3, "id": 0}),
        json!({"type": "media-selected", "id": 0}),
        json!("picker:media-selected"),
        json!(null),
    ] {
        assert_eq!(ctl.handle_message(BASE, &data), Routed::Foreign);
    }
    assert!(events.borrow().is_empty());
}

#[test]
fn unknown_and_malformed_kinds_are_ignored() {
    let ctl = controller();
    ctl.activate(ActivateOptions::overlay(noop())).unwrap();
    assert_eq!(
        ctl.handle_message(BASE, &json!({"type": "picker:resize", "height": 10})),
        Routed::Ignored
    );
    assert_eq!(
        ctl.handle_message(BASE, &json!({"type": "picker:media-selected", "id": 0})),
        Routed::Ignored
    );
    assert!(ctl.is_active(IntegrationId::Overlay));
}

#[test]
fn closed_message_closes_the_named_integration_and_tolerates_repeats() {
    let ctl = controller();
    let host = ctl.dom().add_div("picker");
    let frame = ctl
        .activate(ActivateOptions::iframe(Container::Element(host.clone()), noop()))
        .unwrap();
    ctl.activate(ActivateOptions::overlay(noop())).unwrap();

    let close = json!({"type": "picker:closed", "id": frame.as_u32()});
    assert_eq!(ctl.handle_message(BASE, &close), Routed::Handled);
    assert!(host.children().is_empty());
    assert!(ctl.is_active(IntegrationId::Overlay));

    // The local close already happened; a late message must be harmless.
    assert_eq!(ctl.handle_message(BASE, &close), Routed::Handled);

    ctl.handle_message(BASE, &json!({"type": "picker:closed", "id": 0}));
    assert!(!ctl.is_active(IntegrationId::Overlay));
}

#[test]
fn copy_goes_to_copy_callback_only_when_the_button_is_shown() {
    let ctl = controller();
    let (select, selections) = recorder();
    let (copy, copies) = recorder();
    let host = ctl.dom().add_div("picker");
    let id = ctl
        .activate(
            ActivateOptions::iframe(Container::Element(host.clone()), select)
                .with_copy_button(copy.clone()),
        )
        .unwrap();

    ctl.handle_message(BASE, &copied(id.as_u32(), 3));
    assert_eq!(copies.borrow().len(), 1);
    assert!(selections.borrow().is_empty());
    assert!(host.iframe().is_some());

    // Same callback, button hidden: nothing is called.
    let hidden = ctl
        .activate(ActivateOptions {
            show_copy_button: Some(false),
            on_copy_media: Some(copy),
            ..ActivateOptions::iframe(Container::Element(host.clone()), noop())
        })
        .unwrap();
    ctl.handle_message(BASE, &copied(hidden.as_u32(), 4));
    assert_eq!(copies.borrow().len(), 1);
}

#[test]
fn copy_does_not_close_the_overlay() {
    let ctl = controller();
    let (copy, copies) = recorder();
    ctl.activate(ActivateOptions::overlay(noop()).with_copy_button(copy))
        .unwrap();
    ctl.handle_message(BASE, &copied(0, 1));
    assert_eq!(copies.borrow().len(), 1);
    assert!(ctl.is_active(IntegrationId::Overlay));
}

#[test]
fn messages_for_unknown_integrations_are_dropped() {
    let ctl = controller();
    let (callback, events) = recorder();
    ctl.activate(ActivateOptions::overlay(callback)).unwrap();
    assert_eq!(ctl.handle_message(BASE, &selected(12, 1)), Routed::Handled);
    assert_eq!(ctl.handle_message(BASE, &copied(1, 1)), Routed::Handled);
    assert!(events.borrow().is_empty());
}

#[test]
fn callbacks_may_reenter_the_controller() {
    let ctl = Rc::new(controller());
    let reopened = Rc::new(Cell::new(false));
    let callback = {
        let ctl = Rc::downgrade(&ctl);
        let reopened = Rc::clone(&reopened);
        MediaCallback::new(move |event: &MediaEvent| {
            let Some(ctl) = ctl.upgrade() else { return };
            // Open a modal at the point where the overlay pick happened.
            ctl.activate(ActivateOptions::modal(
                Position::new(20.0, 20.0),
                |_: &MediaEvent| {},
            ))
            .unwrap();
            reopened.set(event.id == IntegrationId::Overlay);
        })
    };
    ctl.activate(ActivateOptions::overlay(callback)).unwrap();
    ctl.handle_message(BASE, &selected(0, 1));

    assert!(reopened.get());
    assert!(ctl.is_active(IntegrationId::Modal));
    assert!(!ctl.is_active(IntegrationId::Overlay));
}

#[test]
fn username_messages_update_the_username() {
    let ctl = controller();
    ctl.handle_message(
        BASE,
        &json!({"type": "picker:username-selected", "id": 0, "username": "[cat]lover_9"}),
    );
    assert_eq!(ctl.username().as_deref(), Some("[cat]lover_9"));

    // Invalid names from the picker are refused like any other.
    ctl.handle_message(
        BASE,
        &json!({"type": "picker:username-selected", "id": 0, "username": "<img src=x>"}),
    );
    assert_eq!(ctl.username().as_deref(), Some("[cat]lover_9"));

    ctl.handle_message(BASE, &json!({"type": "picker:username-cleared", "id": 0}));
    assert_eq!(ctl.username(), None);
}

#[test]
fn event_payload_serializes_like_the_picker_sent_it() {
    let ctl = controller();
    let (callback, events) = recorder();
    ctl.activate(ActivateOptions::overlay(callback)).unwrap();
    ctl.handle_message(BASE, &selected(0, 77));
    let value = serde_json::to_value(&events.borrow()[0]).unwrap();
    assert_eq!(value["id"], json!(0));
    assert_eq!(value["type"], json!("overlay"));
    assert_eq!(value["media"], common::media(77));
}
