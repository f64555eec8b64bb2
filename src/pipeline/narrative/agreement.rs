//! Gender agreement table.
//!
//! Every gendered word the composer emits comes from here. Unspecified gender
//! renders dual forms ("le/la patient(e)", "il/elle").

use crate::models::Gender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Masculine,
    Feminine,
    Dual,
}

/// Agreement data for one gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Agreement {
    form: Form,
    /// "le patient"
    pub subject: &'static str,
    /// "Le patient"
    pub subject_cap: &'static str,
    /// "il"
    pub pronoun: &'static str,
    /// "Il"
    pub pronoun_cap: &'static str,
    /// Past participle / adjective suffix: "", "e" or "(e)".
    pub suffix: &'static str,
    /// "porteur" / "porteuse"
    pub wearer: &'static str,
}

const MASCULINE: Agreement = Agreement {
    form: Form::Masculine,
    subject: "le patient",
    subject_cap: "Le patient",
    pronoun: "il",
    pronoun_cap: "Il",
    suffix: "",
    wearer: "porteur",
};

const FEMININE: Agreement = Agreement {
    form: Form::Feminine,
    subject: "la patiente",
    subject_cap: "La patiente",
    pronoun: "elle",
    pronoun_cap: "Elle",
    suffix: "e",
    wearer: "porteuse",
};

const UNSPECIFIED: Agreement = Agreement {
    form: Form::Dual,
    subject: "le/la patient(e)",
    subject_cap: "Le/la patient(e)",
    pronoun: "il/elle",
    pronoun_cap: "Il/Elle",
    suffix: "(e)",
    wearer: "porteur/porteuse",
};

/// Alertness labels with their (masculine, feminine, dual) renderings.
const ALERTNESS_FORMS: &[(&str, [&str; 3])] = &[
    ("Éveillé et alerte", ["éveillé et alerte", "éveillée et alerte", "éveillé(e) et alerte"]),
    ("Léthargique", ["léthargique", "léthargique", "léthargique"]),
    ("Somnolent", ["somnolent", "somnolente", "somnolent(e)"]),
    ("Obnubilé", ["obnubilé", "obnubilée", "obnubilé(e)"]),
    ("Stuporeux", ["stuporeux", "stuporeuse", "stuporeux(se)"]),
    ("Comateux", ["comateux", "comateuse", "comateux(se)"]),
];

impl Agreement {
    pub fn for_gender(gender: Option<Gender>) -> &'static Agreement {
        match gender {
            Some(Gender::Masculine) => &MASCULINE,
            Some(Gender::Feminine) => &FEMININE,
            None => &UNSPECIFIED,
        }
    }

    /// Append the agreement suffix to a participle: "orienté" -> "orientée".
    pub fn agree(&self, participle: &str) -> String {
        format!("{participle}{}", self.suffix)
    }

    /// Agreed, lowercased alertness state. Unknown labels are lowercased as-is.
    pub fn alertness(&self, label: &str) -> String {
        let column = match self.form {
            Form::Masculine => 0,
            Form::Feminine => 1,
            Form::Dual => 2,
        };
        ALERTNESS_FORMS
            .iter()
            .find(|(known, _)| *known == label)
            .map(|(_, forms)| forms[column].to_string())
            .unwrap_or_else(|| label.to_lowercase())
    }
}
