use std::collections::BTreeMap;
use tracing::debug;

use super::relevance::RelevanceEvaluator;
use super::types::{PromptPath, RetrievedItem};

/// Generation request, one variant per answer path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Bare {
        question: String,
    },
    Contextual {
        context: String,
        question: String,
    },
    Augmented {
        summary: String,
        question: String,
        context: String,
    },
}

impl Prompt {
    pub fn path(&self) -> PromptPath {
        match self {
            Self::Bare { .. } => PromptPath::Bare,
            Self::Contextual { .. } => PromptPath::Contextual,
            Self::Augmented { .. } => PromptPath::Augmented,
        }
    }

    /// Named prompt variables handed to the generator
    pub fn variables(&self) -> BTreeMap<&'static str, String> {
        let mut vars = BTreeMap::new();
        match self {
            Self::Bare { question } => {
                vars.insert("question", question.clone());
            }
            Self::Contextual { context, question } => {
                vars.insert("context", context.clone());
                vars.insert("question", question.clone());
            }
            Self::Augmented {
                summary,
                question,
                context,
            } => {
                vars.insert("summary", summary.clone());
                vars.insert("question", question.clone());
                vars.insert("context", context.clone());
            }
        }
        vars
    }

    /// Final prompt text sent to the model
    pub fn render(&self) -> String {
        match self {
            Self::Bare { question } => question.clone(),
            Self::Contextual { context, question } => format!("{}\n\n{}", context, question),
            Self::Augmented {
                summary,
                question,
                context,
            } => format!(
                "\nAnswer the queries based on the provided context.\n\
                 Summary: {}\n\
                 Question: {}\n\
                 Context: {}\n\
                 Answer: \n",
                summary, question, context
            ),
        }
    }
}

/// Choose the prompt for a turn.
///
/// Retrieved items are only trusted when the session already has context and
/// the items pass the relevance check. Items without context never augment.
pub fn select_prompt(question: &str, context: Option<&str>, summary: &[RetrievedItem]) -> Prompt {
    let context = context.filter(|c| !c.is_empty());

    match (summary.is_empty(), context) {
        (true, None) => Prompt::Bare {
            question: question.to_string(),
        },
        (true, Some(context)) => Prompt::Contextual {
            context: context.to_string(),
            question: question.to_string(),
        },
        (false, None) => {
            debug!("Ignoring {} retrieved items: session has no context", summary.len());
            Prompt::Bare {
                question: question.to_string(),
            }
        }
        (false, Some(context)) => {
            let rendered: Vec<String> = summary.iter().map(RetrievedItem::render).collect();

            if RelevanceEvaluator::is_relevant(question, &rendered) {
                Prompt::Augmented {
                    summary: rendered.join("\n"),
                    question: question.to_string(),
                    context: context.to_string(),
                }
            } else {
                debug!("Retrieved items not relevant to question, using bare prompt");
                Prompt::Bare {
                    question: question.to_string(),
                }
            }
        }
    }
}
