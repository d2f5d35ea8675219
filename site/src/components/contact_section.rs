#![allow(non_snake_case)]
use super::UiTick;
use crate::shell::PageSignals;
use dioxus::prelude::*;
use portfolio_site::services::page::{DegradedView, Surface};
use portfolio_site::state::ComponentKind;
use portfolio_site::widgets::{ContactForm, Field, FormPhase, NoticeKind};
use portfolio_site::Site;
use std::rc::Rc;

#[component]
pub fn ContactSection() -> Element {
    let site = use_context::<Rc<Site>>();
    let tick = use_context::<UiTick>();
    let page = use_context::<PageSignals>();
    tick.watch();

    if matches!(page.degraded_view(ComponentKind::Contact), Some(DegradedView::PlainContactForm)) {
        return rsx! {
            section { id: "contact", class: "contact",
                h2 { "Get in Touch" }
                p { class: "contact-unavailable", "The contact form is unavailable right now. Please try again later." }
            }
        };
    }
    let Some(form) = site.contact.clone() else {
        return None;
    };
    let fields = form.fields();
    let phase = form.phase();
    let busy = form.is_submitting();
    let label = form.submit_label();
    let form_class = format!("contact-form glass-card{}", page.surface_classes(Surface::ContactForm));

    let input = |field: Field| {
        let form = form.clone();
        move |evt: FormEvent| form.update_field(field, evt.value())
    };
    let submit = {
        let site = site.clone();
        move |_: FormEvent| {
            let Some(started) = site.begin_contact() else {
                return;
            };
            tick.touch();
            let site = site.clone();
            spawn(async move {
                if let Some(payload) = &started.payload {
                    site.send_contact(payload).await;
                    tick.touch();
                }
                if let Some(form) = &site.contact {
                    dismiss_after_display(form, started.attempt).await;
                }
                tick.touch();
            });
        }
    };
    let close_success = {
        let form = form.clone();
        move |_: MouseEvent| {
            form.dismiss_success();
            tick.touch();
        }
    };
    let close_error = {
        let form = form.clone();
        move |_: MouseEvent| {
            form.dismiss_error();
            tick.touch();
        }
    };

    rsx! {
        section { id: "contact", class: "contact",
            h2 { "Get in Touch" }
            form {
                id: "contact-form",
                class: "{form_class}",
                prevent_default: "onsubmit",
                onsubmit: submit,
                input { r#type: "text", name: "name", placeholder: "Name", value: "{fields.name}", disabled: busy, oninput: input(Field::Name) }
                input { r#type: "email", name: "email", placeholder: "Email", value: "{fields.email}", disabled: busy, oninput: input(Field::Email) }
                input { r#type: "text", name: "subject", placeholder: "Subject", value: "{fields.subject}", disabled: busy, oninput: input(Field::Subject) }
                textarea { name: "message", placeholder: "Message", rows: "5", value: "{fields.message}", disabled: busy, oninput: input(Field::Message) }
                button { r#type: "submit", class: "submit-button", disabled: busy, "{label}" }
            }
            {match phase {
                FormPhase::Succeeded => rsx! {
                    div { class: "success-overlay", role: "status",
                        h3 { "Message Sent!" }
                        p { "Thank you for reaching out. I'll get back to you soon." }
                        button { class: "notice-close", aria_label: "Close", onclick: close_success, "×" }
                    }
                },
                FormPhase::Failed(notice) => {
                    let kind_class = notice_class(notice.kind);
                    rsx! {
                        div { class: "error-notice {kind_class}", role: "alert",
                            h4 { "{notice.title}" }
                            p { "{notice.message}" }
                            button { class: "notice-close", aria_label: "Close", onclick: close_error, "×" }
                        }
                    }
                }
                FormPhase::Idle | FormPhase::Submitting => None,
            }}
        }
    }
}

// Success and error notices close themselves after their display time,
// unless a newer submission replaced them meanwhile.
async fn dismiss_after_display(form: &Rc<ContactForm>, attempt: u64) {
    let wait = match form.phase() {
        FormPhase::Succeeded => form.success_display(),
        FormPhase::Failed(_) => form.error_display(),
        FormPhase::Idle | FormPhase::Submitting => return,
    };
    tokio::time::sleep(wait).await;
    form.dismiss_notice(attempt);
}

fn notice_class(kind: NoticeKind) -> &'static str {
    match kind {
        NoticeKind::Validation => "notice-validation",
        NoticeKind::Timeout => "notice-timeout",
        NoticeKind::Network => "notice-network",
        NoticeKind::Rejected => "notice-rejected",
    }
}
