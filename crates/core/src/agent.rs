//! Healthcare Appointment Agent
//!
//! This module builds the agent specification handed to the upstream model: who the
//! assistant is, what it must say first, and which tools it may call. The
//! specification is rebuilt on every request because the instructions name a
//! concrete appointment date relative to "now".

use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// The appointment is always confirmed for this many days after the current date.
pub const APPOINTMENT_LEAD_DAYS: i64 = 2;
/// The appointment time is not derived from anything; it is part of the script.
pub const APPOINTMENT_TIME: &str = "10:00 AM";
/// Weekday, month and day of month. No year.
pub const APPOINTMENT_DATE_FORMAT: &str = "%A, %B %d";

pub const AGENT_NAME: &str = "Healthcare Appointment Agent";
pub const AGENT_DESCRIPTION: &str =
    "An agent that helps patients manage their healthcare appointments";

pub const RECORD_DOCTOR_NOTES: &str = "recordDoctorNotes";
pub const PROVIDE_MEDICATION_INFORMATION: &str = "provideMedicationInformation";
pub const RESCHEDULE_APPOINTMENT: &str = "rescheduleAppointment";

// --- Agent Specification ---

/// The complete specification of the appointment assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(rename = "publicDescription")]
    pub description: String,
    pub instructions: String,
    pub tools: Vec<ToolSchema>,
}

/// The only kind of tool the agent offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    #[default]
    Function,
}

/// A function the model may ask the client to call.
///
/// Serialized in the flat form used by realtime sessions:
/// `{"type": "function", "name": ..., "description": ..., "parameters": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub r#type: ToolType,
    pub name: String,
    pub description: String,
    /// A JSON Schema object describing the arguments.
    pub parameters: Value,
}

impl ToolSchema {
    /// Creates a tool whose arguments are all strings.
    ///
    /// # Arguments
    ///
    /// * `properties` - `(name, description)` pairs, in declaration order.
    /// * `required` - names of the arguments the model must always supply.
    pub fn with_string_parameters(
        name: &str,
        description: &str,
        properties: &[(&str, &str)],
        required: &[&str],
    ) -> Self {
        let properties: Map<String, Value> = properties
            .iter()
            .map(|(arg, arg_description)| {
                (
                    arg.to_string(),
                    json!({ "type": "string", "description": arg_description }),
                )
            })
            .collect();

        Self {
            r#type: ToolType::Function,
            name: name.to_string(),
            description: description.to_string(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

// --- Builders ---

/// Builds the agent specification against the system clock.
pub fn build_agent_config() -> AgentConfig {
    build_agent_config_with(&SystemClock)
}

/// Builds the agent specification against an explicit time source.
pub fn build_agent_config_with(clock: &dyn Clock) -> AgentConfig {
    let appointment_date = format_appointment_date(clock.now());

    AgentConfig {
        name: AGENT_NAME.to_string(),
        description: AGENT_DESCRIPTION.to_string(),
        instructions: render_instructions(&appointment_date, APPOINTMENT_TIME),
        tools: healthcare_tools(),
    }
}

/// Returns the date the patient is being called about, e.g. `"Friday, March 01"`.
pub fn format_appointment_date(now: DateTime<Utc>) -> String {
    (now + TimeDelta::days(APPOINTMENT_LEAD_DAYS))
        .format(APPOINTMENT_DATE_FORMAT)
        .to_string()
}

fn render_instructions(appointment_date: &str, appointment_time: &str) -> String {
    format!(
        "You are Sarah, a medical office assistant at Dr. Smith's office.
Your job is to help patients with their appointments and answer questions about their healthcare.

In your first message, confirm the patient's appointment for {appointment_date} at {appointment_time} and ask if they can still make it.
Do not engage in small talk before confirming the appointment.
Always identify yourself as Sarah from Dr. Smith's office in your opening message.

If the patient asks about medications, use the medication tool to provide information.
Use the doctor notes tool to record important information shared during the conversation.

Be professional, friendly, and helpful. Provide clear information about appointment scheduling,
medical procedures, and office policies. If you don't know something, say so and offer to have
the doctor address their question during their appointment.
"
    )
}

/// The three tools offered to the model, in the order they are always sent.
pub fn healthcare_tools() -> Vec<ToolSchema> {
    vec![
        ToolSchema::with_string_parameters(
            RECORD_DOCTOR_NOTES,
            "Record important information for the doctor to review before the appointment",
            &[("notes", "The information to record in the patient's file")],
            &["notes"],
        ),
        ToolSchema::with_string_parameters(
            PROVIDE_MEDICATION_INFORMATION,
            "Provide information about a medication",
            &[("medication", "The name of the medication")],
            &["medication"],
        ),
        ToolSchema::with_string_parameters(
            RESCHEDULE_APPOINTMENT,
            "Reschedule a patient's appointment",
            &[
                ("date", "The new date for the appointment (YYYY-MM-DD)"),
                ("time", "The new time for the appointment (HH:MM AM/PM)"),
            ],
            &["date", "time"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn pinned(year: i32, month: u32, day: u32, hour: u32) -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap())
    }

    #[test]
    fn test_appointment_date_is_two_days_out() {
        // Wednesday, 2024-01-10 -> Friday, 2024-01-12
        let date = format_appointment_date(pinned(2024, 1, 10, 9).now());
        assert_eq!(date, "Friday, January 12");
    }

    #[test]
    fn test_appointment_date_crosses_month_and_year() {
        let date = format_appointment_date(pinned(2024, 12, 31, 23).now());
        assert_eq!(date, "Thursday, January 02");

        // Leap year
        let date = format_appointment_date(pinned(2024, 2, 28, 0).now());
        assert_eq!(date, "Friday, March 01");
    }

    #[test]
    fn test_instructions_mention_date_and_time() {
        let config = build_agent_config_with(&pinned(2024, 1, 10, 9));

        assert!(
            config
                .instructions
                .contains("confirm the patient's appointment for Friday, January 12 at 10:00 AM")
        );
        assert!(config.instructions.contains("Sarah"));
        assert!(config.instructions.contains("Dr. Smith's office"));
        assert!(!config.instructions.contains("2024"));
    }

    #[test]
    fn test_config_metadata() {
        let config = build_agent_config_with(&pinned(2024, 1, 10, 9));
        assert_eq!(config.name, "Healthcare Appointment Agent");
        assert_eq!(
            config.description,
            "An agent that helps patients manage their healthcare appointments"
        );
    }

    #[test]
    fn test_tools_are_fixed_and_ordered() {
        let config = build_agent_config_with(&pinned(2030, 6, 1, 12));
        let names: Vec<&str> = config.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                RECORD_DOCTOR_NOTES,
                PROVIDE_MEDICATION_INFORMATION,
                RESCHEDULE_APPOINTMENT
            ]
        );

        // Tools do not depend on the clock.
        let other = build_agent_config_with(&pinned(1999, 1, 1, 0));
        assert_eq!(config.tools, other.tools);
        assert_eq!(config.tools, healthcare_tools());
    }

    #[test]
    fn test_reschedule_tool_parameters() {
        let tools = healthcare_tools();
        let reschedule = &tools[2];

        assert_eq!(
            reschedule.parameters,
            json!({
                "type": "object",
                "properties": {
                    "date": {
                        "type": "string",
                        "description": "The new date for the appointment (YYYY-MM-DD)"
                    },
                    "time": {
                        "type": "string",
                        "description": "The new time for the appointment (HH:MM AM/PM)"
                    }
                },
                "required": ["date", "time"]
            })
        );
    }

    #[test]
    fn test_tool_schema_serializes_flat() {
        let tools = healthcare_tools();
        let json = serde_json::to_value(&tools[0]).unwrap();

        assert_eq!(json["type"], "function");
        assert_eq!(json["name"], "recordDoctorNotes");
        assert_eq!(json["parameters"]["required"], json!(["notes"]));
        assert!(json.get("function").is_none());
    }

    #[test]
    fn test_agent_config_uses_public_description_key() {
        let config = build_agent_config_with(&pinned(2024, 1, 10, 9));
        let json = serde_json::to_value(&config).unwrap();

        assert!(json.get("publicDescription").is_some());
        assert!(json.get("description").is_none());
        assert_eq!(json["tools"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_system_clock_config_targets_two_days_out() {
        let before = format_appointment_date(Utc::now());
        let config = build_agent_config();
        let after = format_appointment_date(Utc::now());

        assert!(
            config.instructions.contains(&before) || config.instructions.contains(&after),
            "instructions should mention {before}"
        );
        assert!(config.instructions.contains(APPOINTMENT_TIME));
    }

    #[test]
    fn test_tool_schema_rejects_other_types() {
        let result: Result<ToolSchema, _> = serde_json::from_value(json!({
            "type": "retrieval",
            "name": "x",
            "description": "y",
            "parameters": {}
        }));
        assert!(result.is_err());

        let untyped: Result<ToolSchema, _> = serde_json::from_value(json!({
            "name": "x",
            "description": "y",
            "parameters": {}
        }));
        assert!(untyped.is_err());
    }

    #[test]
    fn test_tool_schema_accepts_its_own_output() {
        for tool in healthcare_tools() {
            let wire = serde_json::to_value(&tool).unwrap();
            let parsed: ToolSchema = serde_json::from_value(wire).unwrap();
            assert_eq!(parsed.r#type, ToolType::Function);
            assert_eq!(parsed, tool);
        }
    }
}
