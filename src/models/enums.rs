use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is the French form label, also used on the wire.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Gender {
    Masculine => "Masculin",
    Feminine => "Féminin",
});

str_enum!(Shift {
    Day => "Jour",
    Evening => "Soir",
    Night => "Nuit",
});

str_enum!(PainSeverity {
    None => "0 - Aucune douleur",
    Mild => "1-3 - Douleur légère",
    Moderate => "4-6 - Douleur modérée",
    Severe => "7-10 - Douleur sévère",
});

str_enum!(Visit {
    Family => "Visite de la famille",
    Physician => "Visite du médecin",
    NoVisit => "Aucune visite",
});

str_enum!(CodeStatus {
    FullCode => "Réanimation complète",
    DoNotResuscitate => "Ne pas réanimer (NPR)",
});

str_enum!(AnswerComplexity {
    Simple => "Simple",
    Detailed => "Détaillé",
});

impl Default for AnswerComplexity {
    fn default() -> Self {
        Self::Simple
    }
}

impl PainSeverity {
    /// Intensity word used in prose ("modérée"), without the numeric range.
    pub fn intensity(&self) -> &'static str {
        match self {
            Self::None => "nulle",
            Self::Mild => "légère",
            Self::Moderate => "modérée",
            Self::Severe => "sévère",
        }
    }

    /// The "no pain" category short-circuits the pain narrative.
    pub fn is_pain_free(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn gender_round_trips_french_label() {
        assert_eq!(Gender::Feminine.as_str(), "Féminin");
        assert_eq!(Gender::from_str("Masculin").unwrap(), Gender::Masculine);
    }

    #[test]
    fn invalid_label_is_rejected() {
        let err = Shift::from_str("Matin").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn serde_uses_french_labels() {
        let json = serde_json::to_string(&PainSeverity::Moderate).unwrap();
        assert_eq!(json, "\"4-6 - Douleur modérée\"");
        let parsed: Visit = serde_json::from_str("\"Visite du médecin\"").unwrap();
        assert_eq!(parsed, Visit::Physician);
    }

    #[test]
    fn answer_complexity_defaults_to_simple() {
        assert_eq!(AnswerComplexity::default(), AnswerComplexity::Simple);
        assert_eq!(
            AnswerComplexity::from_str("Détaillé").unwrap(),
            AnswerComplexity::Detailed
        );
    }

    #[test]
    fn only_zero_severity_is_pain_free() {
        assert!(PainSeverity::None.is_pain_free());
        assert!(!PainSeverity::Mild.is_pain_free());
        assert_eq!(PainSeverity::Severe.intensity(), "sévère");
    }
}
