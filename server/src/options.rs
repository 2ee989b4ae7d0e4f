use std::sync::Arc;
use wheel_shared::protocol::PresetName;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    #[error("option text is empty")]
    Empty,
    #[error("option `{0}` already exists")]
    Duplicate(String),
    #[error("no option at index {0}")]
    OutOfRange(usize),
    #[error("options cannot be added or removed while the wheel is spinning")]
    Spinning,
}

/// Ordered list of distinct, non-empty labels. Index `i` is wheel sector `i`.
///
/// Values are immutable: every edit returns a new set, so a spin in flight keeps
/// the labels it was planned against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSet {
    labels: Arc<[String]>,
}

impl Default for OptionSet {
    fn default() -> Self {
        Self {
            labels: Arc::from(Vec::<String>::new()),
        }
    }
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary labels, trimming and rejecting empties and duplicates.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, OptionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .try_fold(OptionSet::new(), |set, label| set.with_added(label.as_ref()))
    }

    pub fn from_preset(preset: Preset) -> Self {
        Self {
            labels: preset.labels().iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    fn checked_label(&self, text: &str) -> Result<String, OptionError> {
        let label = text.trim();
        if label.is_empty() {
            return Err(OptionError::Empty);
        }
        if self.contains(label) {
            return Err(OptionError::Duplicate(label.to_string()));
        }
        Ok(label.to_string())
    }

    /// Append a label at the end of the wheel.
    pub fn with_added(&self, text: &str) -> Result<Self, OptionError> {
        let label = self.checked_label(text)?;
        let labels: Vec<String> = self
            .labels
            .iter()
            .cloned()
            .chain(std::iter::once(label))
            .collect();
        Ok(Self {
            labels: labels.into(),
        })
    }

    /// Remove the label at `index`; later labels shift down by one.
    pub fn without(&self, index: usize) -> Result<Self, OptionError> {
        if index >= self.len() {
            return Err(OptionError::OutOfRange(index));
        }
        let labels: Vec<String> = self
            .labels
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, l)| l.clone())
            .collect();
        Ok(Self {
            labels: labels.into(),
        })
    }

    /// Replace the text at `index` in place. Indices of other labels are untouched.
    pub fn with_edited(&self, index: usize, text: &str) -> Result<Self, OptionError> {
        if index >= self.len() {
            return Err(OptionError::OutOfRange(index));
        }
        let label = self.checked_label(text)?;
        let mut labels: Vec<String> = self.labels.to_vec();
        labels[index] = label;
        Ok(Self {
            labels: labels.into(),
        })
    }
}

/// Built-in option lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    YesNo,
    Numbers,
    Colors,
    Food,
}

impl Preset {
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Preset::YesNo => &["Yes", "No"],
            Preset::Numbers => &["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"],
            Preset::Colors => &["Red", "Blue", "Green", "Yellow", "Purple", "Orange"],
            Preset::Food => &["Pizza", "Burger", "Sushi", "Pasta", "Tacos", "Salad"],
        }
    }
}

impl From<PresetName> for Preset {
    fn from(name: PresetName) -> Self {
        match name {
            PresetName::Yesno => Preset::YesNo,
            PresetName::Numbers => Preset::Numbers,
            PresetName::Colors => Preset::Colors,
            PresetName::Food => Preset::Food,
        }
    }
}
