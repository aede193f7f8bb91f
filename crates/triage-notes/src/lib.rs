//! Labor triage note model and its display formatting.
//!
//! Notes are stored as JSON documents by the backing document database; the
//! formatter turns one into the stable, human-readable lines the client app
//! shows to the doula.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetalMovement {
    Normal,
    Reduced,
    Absent,
}

impl FetalMovement {
    pub fn label(self) -> &'static str {
        match self {
            FetalMovement::Normal => "normal",
            FetalMovement::Reduced => "reduced",
            FetalMovement::Absent => "absent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    ContinueMonitoring,
    CallMidwife,
    GoToHospital,
}

impl Disposition {
    /// Shown verbatim in the client app; treat these as stable strings.
    pub fn label(self) -> &'static str {
        match self {
            Disposition::ContinueMonitoring => "Continue monitoring at home",
            Disposition::CallMidwife => "Call the midwife",
            Disposition::GoToHospital => "Go to the hospital",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContractionPattern {
    pub interval_minutes: f32,
    pub duration_seconds: u32,
}

impl ContractionPattern {
    /// The 5-1-1 threshold: contractions five minutes apart lasting a full
    /// minute suggest established labor.
    pub fn is_active_labor(&self) -> bool {
        self.interval_minutes <= 5.0 && self.duration_seconds >= 60
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageNote {
    pub client_name: String,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub gestation_weeks: Option<u8>,
    #[serde(default)]
    pub contractions: Option<ContractionPattern>,
    /// Self-reported, 1 to 10.
    #[serde(default)]
    pub pain_level: Option<u8>,
    #[serde(default)]
    pub fetal_movement: Option<FetalMovement>,
    #[serde(default)]
    pub membranes_ruptured: bool,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub disposition: Disposition,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TriageNote {
    /// Render the note as display lines, omitting absent optional fields.
    ///
    /// The output is deterministic for a given note: fixed field order,
    /// fixed wording.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        lines.push(format!(
            "Triage note for {} ({})",
            self.client_name,
            self.recorded_at.format("%Y-%m-%d %H:%M UTC")
        ));

        if let Some(weeks) = self.gestation_weeks {
            lines.push(format!("Gestation: {weeks} weeks"));
        }

        if let Some(pattern) = &self.contractions {
            let mut line = format!(
                "Contractions: every {:.1} min, lasting {} sec",
                pattern.interval_minutes, pattern.duration_seconds
            );
            if pattern.is_active_labor() {
                line.push_str(" (active labor pattern)");
            }
            lines.push(line);
        }

        if let Some(pain) = self.pain_level {
            lines.push(format!("Pain level: {}/10", pain.min(10)));
        }

        if let Some(movement) = self.fetal_movement {
            lines.push(format!("Fetal movement: {}", movement.label()));
        }

        if self.membranes_ruptured {
            lines.push("Membranes ruptured".to_string());
        }

        if !self.symptoms.is_empty() {
            lines.push(format!("Reported symptoms: {}", self.symptoms.join(", ")));
        }

        lines.push(format!("Recommendation: {}", self.disposition.label()));

        if let Some(notes) = &self.notes {
            if !notes.is_empty() {
                lines.push(format!("Notes: {notes}"));
            }
        }

        lines
    }

    pub fn summary(&self) -> String {
        self.summary_lines().join("\n")
    }
}
