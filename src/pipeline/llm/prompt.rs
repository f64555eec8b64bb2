//! Fixed French instruction templates sent with every generation request.

use crate::models::AnswerComplexity;

/// System prompt for progress-note generation.
pub const NOTE_SYSTEM_PROMPT: &str = "RÔLE : Tu es un infirmier ou une infirmière rédigeant une note \
d'évolution pour le dossier d'un patient, conformément aux standards du système de santé québécois.";

/// Body of the note instruction, placed before the clinical data.
const NOTE_INSTRUCTIONS: &str = "\
TÂCHE : Rédige une note narrative professionnelle, fluide et concise en français. La note doit \
intégrer toutes les données cliniques fournies dans un ou deux paragraphes cohérents.
IMPORTANT :
- Ne commence PAS la note par \"Note d'évolution :\".
- N'inclus PAS la date dans le corps de la note. L'heure peut être incluse si spécifiée dans les données.
- Accorde IMPÉRATIVEMENT le genre de la note (pronoms, adjectifs) en fonction du \"Genre du patient\" \
spécifié. 'Masculin' -> \"le patient\", \"il\". 'Féminin' -> \"la patiente\", \"elle\".";

/// Reply format requirement appended after the clinical data.
const NOTE_REPLY_FORMAT: &str = "Réponds IMPÉRATIVEMENT au format JSON suivant, sans autre texte : \
{\"note\": \"<la note d'évolution infirmière narrative et complète, correctement accordée en genre>\"}";

/// Build the user prompt for one progress note.
pub fn build_note_prompt(clinical_summary: &str) -> String {
    format!(
        "{NOTE_INSTRUCTIONS}\n\nDONNÉES CLINIQUES :\n{}\n\n{NOTE_REPLY_FORMAT}",
        clinical_summary.trim()
    )
}

/// System prompt for the end-of-shift report.
pub const SHIFT_REPORT_SYSTEM_PROMPT: &str = "RÔLE : Tu es un infirmier ou une infirmière \
expérimenté(e) rédigeant un rapport de garde concis et structuré pour l'équipe soignante suivante, \
basé sur les notes d'évolution fournies.";

const SHIFT_REPORT_INSTRUCTIONS: &str = "\
TÂCHE : Pour chaque patient, synthétise les informations des notes d'évolution en un paragraphe \
clair et professionnel. Mets en évidence les événements marquants, les changements d'état, les \
interventions effectuées et les éléments importants à surveiller pour le prochain quart. Utilise le \
format Markdown pour la mise en forme.
IMPORTANT :
- Chaque résumé de patient doit être précédé d'un titre de niveau 2 (## Nom du patient).
- N'inclus PAS la date, seulement l'heure si nécessaire.
- Garde les résumés concis, comme une transmission orale de fin de quart.";

/// Build the user prompt for the shift report from the grouped notes text.
pub fn build_shift_report_prompt(shift_notes: &str) -> String {
    format!(
        "{SHIFT_REPORT_INSTRUCTIONS}\n\nNOTES D'ÉVOLUTION DU QUART :\n{}\n\nRÉPONSE (en format Markdown) :",
        shift_notes.trim_end()
    )
}

/// System prompt for the clinical question assistant.
pub const CLINICAL_ASSISTANT_SYSTEM_PROMPT: &str = "RÔLE : Tu es un assistant clinique IA expert, \
conçu pour le personnel infirmier travaillant dans le système de santé du Québec.";

const CLINICAL_ASSISTANT_INSTRUCTIONS: &str = "\
TÂCHE : Réponds à la question clinique suivante de manière scientifique, concise et adaptée au \
contexte québécois.";

const CLINICAL_ASSISTANT_LEVELS: &str = "\
- Si 'Simple' : Explique en termes clairs et accessibles, comme si tu t'adressais à un patient ou \
un étudiant débutant. Évite le jargon complexe.
- Si 'Détaillé' : Fournis une réponse technique et précise pour un professionnel de la santé, en \
utilisant des termes cliniques appropriés et en mentionnant potentiellement des considérations \
spécifiques au Québec si pertinent.";

/// Build the user prompt for one clinical question.
pub fn build_clinical_question_prompt(question: &str, complexity: AnswerComplexity) -> String {
    format!(
        "{CLINICAL_ASSISTANT_INSTRUCTIONS}\nNIVEAU DE COMPLEXITÉ : \"{complexity}\".\n\
         {CLINICAL_ASSISTANT_LEVELS}\n\nQUESTION : \"{}\"\n\nRÉPONSE :",
        question.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_prompt_embeds_summary_between_instructions_and_format() {
        let prompt = build_note_prompt("Genre du patient: Féminin.\n");
        let data = prompt.find("DONNÉES CLINIQUES :\nGenre du patient: Féminin.").unwrap();
        let format = prompt.find("format JSON").unwrap();
        assert!(prompt.find("Ne commence PAS").unwrap() < data);
        assert!(data < format);
        assert!(prompt.contains("{\"note\""));
    }

    #[test]
    fn shift_report_prompt_asks_for_markdown_sections() {
        let prompt = build_shift_report_prompt("--- Patient: Anne ---\n");
        assert!(prompt.contains("## Nom du patient"));
        assert!(prompt.contains("--- Patient: Anne ---"));
        assert!(prompt.ends_with("RÉPONSE (en format Markdown) :"));
    }

    #[test]
    fn clinical_question_prompt_names_level_and_question() {
        let prompt = build_clinical_question_prompt(
            "  Quelle est la dose maximale d'acétaminophène ?\n",
            AnswerComplexity::Detailed,
        );
        assert!(prompt.starts_with("TÂCHE : Réponds à la question clinique"));
        assert!(prompt.contains("NIVEAU DE COMPLEXITÉ : \"Détaillé\"."));
        assert!(prompt.contains("QUESTION : \"Quelle est la dose maximale d'acétaminophène ?\""));
        assert!(prompt.ends_with("RÉPONSE :"));
    }
}
