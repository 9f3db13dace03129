//! Agency profile example
//!
//! Demonstrates:
//! - Required text and email fields with validation
//! - A logo file field with image previews and an existing server file
//! - A dynamic array of contact entries
//!
//! Run with: cargo run -p formwork-egui --example agency
//! Set `RUST_LOG=formwork=debug` to see preview handles come and go.

use formwork::{
    ChoiceOption, FieldKind, FieldSchema, Form, FormDefinition, FormOptions, FormValues, Rule,
};
use formwork_egui::EguiForm;
use tracing_subscriber::EnvFilter;

fn definition() -> FormDefinition {
    FormDefinition::new(vec![
        FieldSchema::new("name", FieldKind::Text)
            .with_label("Agency name")
            .required()
            .with_rule(Rule::MinLength(2)),
        FieldSchema::new("email", FieldKind::Email)
            .with_label("Email")
            .required()
            .with_placeholder("hello@agency.example"),
        FieldSchema::new("employees", FieldKind::Number)
            .with_label("Employees")
            .value_as_number()
            .with_rule(Rule::Min(1.0)),
        FieldSchema::new("status", FieldKind::Radio)
            .with_label("Status")
            .with_options(vec![
                ChoiceOption::new("active", "Active"),
                ChoiceOption::new("paused", "Paused"),
            ]),
        FieldSchema::new("services", FieldKind::MultiSelect)
            .with_label("Services")
            .with_options(vec!["Design".into(), "Development".into(), "Marketing".into()]),
        FieldSchema::new("logo", FieldKind::File)
            .with_label("Logo")
            .with_accept("image/*"),
        FieldSchema::array(
            "contacts",
            vec![
                FieldSchema::new("key", FieldKind::Text)
                    .with_label("Channel")
                    .required(),
                FieldSchema::new("value", FieldKind::Text).with_label("Address"),
            ],
        )
        .with_label("Contacts"),
    ])
    .with_title("Agency profile")
    .with_description("Fields marked with * are required.")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let values = FormValues::from_json(serde_json::json!({
        "status": "active",
        "contacts": [{ "key": "web", "value": "https://agency.example" }],
    }));

    let submission = EguiForm::new()
        .with_title("Agency profile")
        .with_window_size([520.0, 720.0])
        .run(|allocator| {
            Form::new(definition(), allocator)
                .with_options(FormOptions::new().with_base_url("https://cdn.agency.example"))
                .with_values(values)
                .with_existing_files("logo", ["/uploads/logo.png"])
        })?;

    println!("{}", serde_json::to_string_pretty(&submission)?);
    Ok(())
}
