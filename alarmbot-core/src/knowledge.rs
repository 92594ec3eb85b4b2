//! Static alarm knowledge table.
//!
//! Maps alarm categories to alarm names to resolution procedures, and records
//! which devices have published entries for which categories. The table is
//! assembled once at startup and never mutated afterwards, so it can be shared
//! across front-ends behind an `Arc` without locking.

use std::collections::HashSet;

use thiserror::Error;

use crate::text::normalize;

/// Resolution for the "Circuit Pack Failed" alarm.
pub const CIRCUIT_PACK_FAILED: &str = "Kindly arrange FE at site with a spare card of the same PEC code. Perform Soft Reset, then Warm Reset from NOC, then take logs and JOJI. If the alarm persists, replace the card.";

/// Resolution for the A/B backplane power feed alarms.
pub const POWER_FAILURE: &str = "This alarm is raised against a power feed when the shelf processor detects low or no voltage on the A or B backplane power feed.";

/// Resolution for the "Shutoff Threshold Crossed" alarm.
pub const SHUTOFF_THRESHOLD_CROSSED: &str = "This alarm is raised against an AMP facility when the total input optical power to the amplifier has fallen below the provisioned Shutoff Threshold level.";

/// Resolution for the "Automatic Power Reduction" alarm.
pub const APR: &str = "This alarm occurs due to dirty ports. Clean the TX pigatil and Patch chord and FMS port and Pigatil, if still alarm persists then you need to clean device port, if still persists then you need to change patch chord.";

/// Resolution for optical line / OSC loss-of-signal alarms.
pub const OSC_LOS: &str = "You need to check fiber where the fault is generally occurring. This usually happens due to fiber cuts.";

/// Resolution for the "High Received Span Loss" alarm.
pub const HIGH_RECEIVED_SPAN_LOSS: &str = "Need to clear degradation, take OTDR and LSPM and check where the degradation is happening.";

/// Resolution for the "High Fiber Loss" alarm.
pub const HIGH_FIBER_LOSS: &str = "Check internal patching, clean port, and patch chord.";

/// Resolution for the "Low ORL" alarm.
pub const LOW_ORL: &str = "This alarm is raised against an AMP. You need to clean the TX pigtail, patch chord, and device port.";

/// Errors raised while assembling a [`KnowledgeTable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KnowledgeError {
    /// The same device was registered twice.
    #[error("duplicate device: {0}")]
    DuplicateDevice(String),

    /// The same category was registered twice.
    #[error("duplicate category: {0}")]
    DuplicateCategory(String),

    /// The same alarm was registered twice within one category.
    #[error("duplicate alarm '{alarm}' in category '{category}'")]
    DuplicateAlarm {
        /// Category the alarm was added to.
        category: String,
        /// Display name of the alarm.
        alarm: String,
    },

    /// An alarm or coverage entry referenced a category that was never added.
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// A coverage entry referenced a device that was never added.
    #[error("unknown device: {0}")]
    UnknownDevice(String),
}

/// A device the assistant can be asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Normalized key used for matching and session state.
    pub key: String,
    /// Label shown to users.
    pub label: String,
}

/// Immutable resolution text for one alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionEntry {
    /// Alarm display name, e.g. "Circuit Pack Failed".
    pub alarm: String,
    /// Free-text resolution procedure.
    pub text: String,
}

/// An alarm grouping with its entries in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Normalized key used for matching and session state.
    pub key: String,
    /// Label shown to users.
    pub label: String,
    entries: Vec<ResolutionEntry>,
}

impl Category {
    /// Alarm entries under this category, in registration order.
    pub fn entries(&self) -> &[ResolutionEntry] {
        &self.entries
    }

    /// Find an entry by alarm name, ignoring case and surrounding whitespace.
    pub fn entry(&self, alarm: &str) -> Option<&ResolutionEntry> {
        let wanted = normalize(alarm);
        self.entries.iter().find(|e| normalize(&e.alarm) == wanted)
    }
}

/// Read-only category → alarm → resolution mapping plus device coverage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeTable {
    devices: Vec<Device>,
    categories: Vec<Category>,
    coverage: HashSet<(String, String)>,
}

impl KnowledgeTable {
    /// Start building a table.
    pub fn builder() -> KnowledgeTableBuilder {
        KnowledgeTableBuilder::default()
    }

    /// The built-in troubleshooting table.
    ///
    /// Four devices and two categories are offered; only Ciena hardware alarms
    /// are published so far.
    pub fn builtin() -> Result<Self, KnowledgeError> {
        Self::builder()
            .device("Ciena")
            .device("Huawei")
            .device("MUSE")
            .device("Nokia PSS")
            .category("Hardware")
            .category("Fiber")
            .alarm("hardware", "Circuit Pack Failed", CIRCUIT_PACK_FAILED)
            .alarm("hardware", "Power Failure - A", POWER_FAILURE)
            .alarm("hardware", "Power Failure - B", POWER_FAILURE)
            .alarm(
                "hardware",
                "Shutoff Threshold Crossed",
                SHUTOFF_THRESHOLD_CROSSED,
            )
            .alarm("fiber", "APR", APR)
            .alarm("fiber", "OSC LOS", OSC_LOS)
            .alarm("fiber", "High Received Span Loss", HIGH_RECEIVED_SPAN_LOSS)
            .alarm("fiber", "High Fiber Loss", HIGH_FIBER_LOSS)
            .alarm("fiber", "Low ORL", LOW_ORL)
            .cover("ciena", "hardware")
            .build()
    }

    /// All devices, in registration order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Find a device by user input.
    pub fn device(&self, input: &str) -> Option<&Device> {
        let wanted = normalize(input);
        self.devices.iter().find(|d| d.key == wanted)
    }

    /// All categories, in registration order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Find a category by user input.
    pub fn category(&self, input: &str) -> Option<&Category> {
        let wanted = normalize(input);
        self.categories.iter().find(|c| c.key == wanted)
    }

    /// Alarm entries under a category; empty for an unknown category.
    pub fn alarms(&self, category: &str) -> &[ResolutionEntry] {
        self.category(category)
            .map(Category::entries)
            .unwrap_or_default()
    }

    /// Look up the resolution for `(category, alarm)`.
    pub fn lookup(&self, category: &str, alarm: &str) -> Option<&ResolutionEntry> {
        self.category(category)?.entry(alarm)
    }

    /// Whether alarm entries are published for this device and category.
    pub fn is_covered(&self, device: &str, category: &str) -> bool {
        self.coverage
            .contains(&(normalize(device), normalize(category)))
    }

    /// Every `(device, category, entry)` triple reachable through the dialogue.
    pub fn covered_entries(&self) -> impl Iterator<Item = (&Device, &Category, &ResolutionEntry)> {
        self.devices.iter().flat_map(move |d| {
            self.categories
                .iter()
                .filter(move |c| self.coverage.contains(&(d.key.clone(), c.key.clone())))
                .flat_map(move |c| c.entries.iter().map(move |e| (d, c, e)))
        })
    }
}

/// Builder for [`KnowledgeTable`]; validation happens in [`build`](Self::build).
#[derive(Debug, Default)]
pub struct KnowledgeTableBuilder {
    devices: Vec<String>,
    categories: Vec<String>,
    alarms: Vec<(String, String, String)>,
    coverage: Vec<(String, String)>,
}

impl KnowledgeTableBuilder {
    /// Register a device by display label.
    pub fn device(mut self, label: impl Into<String>) -> Self {
        self.devices.push(label.into());
        self
    }

    /// Register a category by display label.
    pub fn category(mut self, label: impl Into<String>) -> Self {
        self.categories.push(label.into());
        self
    }

    /// Add an alarm entry under a previously registered category.
    pub fn alarm(
        mut self,
        category: impl Into<String>,
        alarm: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.alarms.push((category.into(), alarm.into(), text.into()));
        self
    }

    /// Mark `(device, category)` as having published entries.
    pub fn cover(mut self, device: impl Into<String>, category: impl Into<String>) -> Self {
        self.coverage.push((device.into(), category.into()));
        self
    }

    /// Validate and assemble the table.
    ///
    /// # Errors
    ///
    /// Returns a [`KnowledgeError`] on duplicate devices, categories or alarms,
    /// or when an alarm or coverage entry names something never registered.
    pub fn build(self) -> Result<KnowledgeTable, KnowledgeError> {
        let mut devices: Vec<Device> = Vec::with_capacity(self.devices.len());
        for label in self.devices {
            let key = normalize(&label);
            if devices.iter().any(|d| d.key == key) {
                return Err(KnowledgeError::DuplicateDevice(label));
            }
            devices.push(Device { key, label });
        }

        let mut categories: Vec<Category> = Vec::with_capacity(self.categories.len());
        for label in self.categories {
            let key = normalize(&label);
            if categories.iter().any(|c| c.key == key) {
                return Err(KnowledgeError::DuplicateCategory(label));
            }
            categories.push(Category {
                key,
                label,
                entries: Vec::new(),
            });
        }

        for (category, alarm, text) in self.alarms {
            let key = normalize(&category);
            let target = categories
                .iter_mut()
                .find(|c| c.key == key)
                .ok_or_else(|| KnowledgeError::UnknownCategory(category.clone()))?;
            if target.entry(&alarm).is_some() {
                return Err(KnowledgeError::DuplicateAlarm { category, alarm });
            }
            target.entries.push(ResolutionEntry { alarm, text });
        }

        let mut coverage = HashSet::new();
        for (device, category) in self.coverage {
            let device_key = normalize(&device);
            let category_key = normalize(&category);
            if !devices.iter().any(|d| d.key == device_key) {
                return Err(KnowledgeError::UnknownDevice(device));
            }
            if !categories.iter().any(|c| c.key == category_key) {
                return Err(KnowledgeError::UnknownCategory(category));
            }
            coverage.insert((device_key, category_key));
        }

        Ok(KnowledgeTable {
            devices,
            categories,
            coverage,
        })
    }
}
