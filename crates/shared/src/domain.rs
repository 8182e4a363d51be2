use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! choice_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let raw = raw.trim();
                $(
                    if raw.eq_ignore_ascii_case($wire) {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!(
                    "unknown {} '{raw}' (expected one of: {})",
                    stringify!($name).to_ascii_lowercase(),
                    [$($wire),+].join(", ")
                ))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Professional,
    Playful,
    Formal,
    Casual,
}

choice_enum!(Tone {
    Professional => "professional",
    Playful => "playful",
    Formal => "formal",
    Casual => "casual",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    #[default]
    Positive,
    Neutral,
    Urgent,
}

choice_enum!(Sentiment {
    Positive => "positive",
    Neutral => "neutral",
    Urgent => "urgent",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Length {
    Short,
    #[default]
    Medium,
    Long,
}

choice_enum!(Length {
    Short => "short",
    Medium => "medium",
    Long => "long",
});

/// Ordering applied to the library view after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    Az,
    Za,
}

choice_enum!(SortKey {
    Newest => "newest",
    Oldest => "oldest",
    Az => "az",
    Za => "za",
});

/// Lifecycle of a single generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// Appearance preference persisted under the `theme` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    Light,
    #[default]
    System,
    Dark,
}

choice_enum!(ThemeMode {
    Light => "light",
    System => "system",
    Dark => "dark",
});

impl ThemeMode {
    pub fn is_dark(self, system_prefers_dark: bool) -> bool {
        match self {
            ThemeMode::Dark => true,
            ThemeMode::Light => false,
            ThemeMode::System => system_prefers_dark,
        }
    }
}

/// Number of items requested from the listing endpoint. Only the values in
/// [`PageLimit::ALLOWED`] can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageLimit(u32);

impl PageLimit {
    pub const ALLOWED: [u32; 5] = [9, 12, 24, 36, 48];

    pub fn new(value: u32) -> Option<Self> {
        Self::ALLOWED.contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageLimit {
    fn default() -> Self {
        Self(24)
    }
}

impl TryFrom<u32> for PageLimit {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!(
                "page limit {value} is not one of {:?}",
                PageLimit::ALLOWED
            )
        })
    }
}

impl From<PageLimit> for u32 {
    fn from(value: PageLimit) -> Self {
        value.0
    }
}

impl fmt::Display for PageLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_choices_case_insensitively() {
        assert_eq!("Playful".parse::<Tone>(), Ok(Tone::Playful));
        assert_eq!(" urgent ".parse::<Sentiment>(), Ok(Sentiment::Urgent));
        assert_eq!("ZA".parse::<SortKey>(), Ok(SortKey::Za));
        assert!("loud".parse::<Tone>().unwrap_err().contains("professional"));
    }

    #[test]
    fn page_limit_only_accepts_fixed_set() {
        assert_eq!(PageLimit::default().get(), 24);
        assert!(PageLimit::new(12).is_some());
        assert!(PageLimit::new(10).is_none());
        assert!(serde_json::from_str::<PageLimit>("100").is_err());
        assert_eq!(serde_json::from_str::<PageLimit>("48").unwrap().get(), 48);
    }

    #[test]
    fn theme_mode_resolves_against_system_preference() {
        assert!(ThemeMode::Dark.is_dark(false));
        assert!(!ThemeMode::Light.is_dark(true));
        assert!(ThemeMode::System.is_dark(true));
        assert!(!ThemeMode::System.is_dark(false));
    }
}
