use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    services::providers::{Capability, MovieLookup, TextGenerator, WebSearch},
};

pub const EMPTY_MESSAGE: &str = "Input message must be a non-empty string.";
pub const NOT_CONFIGURED: &str = "Gemini LLM is not configured. Please set up Google credentials.";

/// One parsed model turn
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStep {
    Final(String),
    Act { tool: String, input: String },
}

/// Splits a model turn into either a final answer or a tool call.
///
/// Anything the model writes after its own `Observation:` is dropped, since the
/// observation has to come from the tool. A turn with neither marker is taken
/// as the answer.
pub fn parse_step(output: &str) -> AgentStep {
    let output = match output.find("\nObservation:") {
        Some(idx) => &output[..idx],
        None => output,
    };

    if let Some(idx) = output.find("Final Answer:") {
        return AgentStep::Final(output[idx + "Final Answer:".len()..].trim().to_string());
    }

    let mut tool = None;
    let mut input = None;
    for line in output.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Action Input:") {
            input = Some(rest.trim().trim_matches('"').to_string());
        } else if let Some(rest) = line.strip_prefix("Action:") {
            tool = Some(rest.trim().to_string());
        }
    }

    match (tool, input) {
        (Some(tool), Some(input)) => AgentStep::Act { tool, input },
        _ => AgentStep::Final(output.trim().to_string()),
    }
}

/// Zero-shot reason/act loop over web search and movie lookup
#[derive(Clone)]
pub struct ChatAgent {
    generator: Option<Arc<dyn TextGenerator>>,
    search: Arc<dyn WebSearch>,
    lookup: Arc<dyn MovieLookup>,
    max_steps: usize,
}

impl ChatAgent {
    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        search: Arc<dyn WebSearch>,
        lookup: Arc<dyn MovieLookup>,
        max_steps: usize,
    ) -> Self {
        Self {
            generator,
            search,
            lookup,
            max_steps: max_steps.max(1),
        }
    }

    fn prompt(question: &str, scratchpad: &str) -> String {
        let tools = Capability::ALL
            .iter()
            .map(|c| format!("{}: {}", c.name(), c.description()))
            .collect::<Vec<_>>()
            .join("\n");
        let names = Capability::ALL
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Answer the following question as best you can. You have access to the following tools:\n\n\
             {tools}\n\n\
             Use the following format:\n\n\
             Question: the input question you must answer\n\
             Thought: you should always think about what to do\n\
             Action: the action to take, should be one of [{names}]\n\
             Action Input: the input to the action\n\
             Observation: the result of the action\n\
             ... (this Thought/Action/Action Input/Observation can repeat N times)\n\
             Thought: I now know the final answer\n\
             Final Answer: the final answer to the original input question\n\n\
             Begin!\n\n\
             Question: {question}\n\
             Thought:{scratchpad}"
        )
    }

    /// Runs a tool and renders its result as an observation. Tool failures are
    /// reported to the model rather than aborting the conversation.
    async fn observe(&self, tool: &str, input: &str) -> String {
        match Capability::from_name(tool) {
            Some(Capability::WebSearch) => match self.search.search(input).await {
                Ok(digest) => digest,
                Err(e) => {
                    tracing::error!(error = %e, query = %input, "Web search failed");
                    format!("Search error: {}", e)
                }
            },
            Some(Capability::MovieLookup) => match self.lookup.lookup(input).await {
                Ok(info) => {
                    tracing::info!(query = %input, "IMDB search succeeded");
                    info.summary()
                }
                Err(e) => {
                    tracing::error!(error = %e, query = %input, "IMDB search failed");
                    format!("IMDB search error: {}", e)
                }
            },
            None => {
                let names: Vec<&str> = Capability::ALL.iter().map(|c| c.name()).collect();
                format!(
                    "{} is not a valid tool, try one of [{}].",
                    tool,
                    names.join(", ")
                )
            }
        }
    }

    /// Answers a user message
    pub async fn chat(&self, message: &str) -> AppResult<String> {
        let question = message.trim();
        if question.is_empty() {
            return Err(AppError::Validation(EMPTY_MESSAGE.to_string()));
        }

        let Some(generator) = &self.generator else {
            tracing::error!("Chat requested without a configured LLM");
            return Err(AppError::Unconfigured(NOT_CONFIGURED.to_string()));
        };

        tracing::info!(message = %question, "User message");

        let mut scratchpad = String::new();
        for step in 1..=self.max_steps {
            let output = generator
                .generate(&Self::prompt(question, &scratchpad))
                .await?;

            match parse_step(&output) {
                AgentStep::Final(answer) => {
                    tracing::info!(steps = step, chars = answer.len(), "Agent answered");
                    return Ok(answer);
                }
                AgentStep::Act { tool, input } => {
                    tracing::debug!(step, tool = %tool, input = %input, "Agent action");
                    let observation = self.observe(&tool, &input).await;
                    scratchpad.push_str(&format!(
                        " {}\nObservation: {}\nThought:",
                        output.trim(),
                        observation
                    ));
                }
            }
        }

        tracing::warn!(max_steps = self.max_steps, "Agent gave up without an answer");
        Err(AppError::ExternalService(format!(
            "agent stopped after {} steps without a final answer",
            self.max_steps
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{MockMovieLookup, MockTextGenerator, MockWebSearch, MovieInfo};
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn agent(
        generator: Option<MockTextGenerator>,
        search: MockWebSearch,
        lookup: MockMovieLookup,
    ) -> ChatAgent {
        ChatAgent::new(
            generator.map(|g| Arc::new(g) as Arc<dyn TextGenerator>),
            Arc::new(search),
            Arc::new(lookup),
            3,
        )
    }

    #[test]
    fn test_parse_final_answer() {
        let step = parse_step("I know this.\nFinal Answer: Christopher Nolan directed it.");
        assert_eq!(
            step,
            AgentStep::Final("Christopher Nolan directed it.".to_string())
        );
    }

    #[test]
    fn test_parse_action_drops_invented_observation() {
        let step = parse_step(
            " I should look it up.\nAction: imdb_search\nAction Input: \"The Godfather\"\nObservation: made up\nFinal Answer: guess",
        );
        assert_eq!(
            step,
            AgentStep::Act {
                tool: "imdb_search".to_string(),
                input: "The Godfather".to_string()
            }
        );
    }

    #[test]
    fn test_parse_plain_text_is_final() {
        assert_eq!(
            parse_step("  Just a reply.  "),
            AgentStep::Final("Just a reply.".to_string())
        );
    }

    #[tokio::test]
    async fn test_rejects_blank_message() {
        let agent = agent(None, MockWebSearch::new(), MockMovieLookup::new());
        let err = agent.chat("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == EMPTY_MESSAGE));
    }

    #[tokio::test]
    async fn test_unconfigured_llm() {
        let agent = agent(None, MockWebSearch::new(), MockMovieLookup::new());
        let err = agent.chat("Who directed Heat?").await.unwrap_err();
        assert_eq!(err.to_string(), NOT_CONFIGURED);
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Ok("Final Answer: Comedy and drama are rated highest.".to_string()));

        let agent = agent(Some(generator), MockWebSearch::new(), MockMovieLookup::new());
        let answer = agent.chat("What are the best rated genres?").await.unwrap();
        assert_eq!(answer, "Comedy and drama are rated highest.");
    }

    #[tokio::test]
    async fn test_lookup_observation_feeds_next_turn() {
        let mut seq = Sequence::new();
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("Action: imdb_search\nAction Input: The Godfather".to_string()));
        generator
            .expect_generate()
            .withf(|prompt: &str| prompt.contains("Observation: Title: The Godfather\nDirector: Francis Ford Coppola"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("Final Answer: Francis Ford Coppola".to_string()));

        let mut lookup = MockMovieLookup::new();
        lookup
            .expect_lookup()
            .with(eq("The Godfather"))
            .times(1)
            .returning(|_| {
                Ok(MovieInfo {
                    title: "The Godfather".to_string(),
                    year: None,
                    genre: None,
                    director: Some("Francis Ford Coppola".to_string()),
                    actors: None,
                    plot: None,
                    imdb_rating: None,
                    imdb_id: None,
                })
            });

        let agent = agent(Some(generator), MockWebSearch::new(), lookup);
        let answer = agent.chat("Who directed The Godfather?").await.unwrap();
        assert_eq!(answer, "Francis Ford Coppola");
    }

    #[tokio::test]
    async fn test_search_failure_becomes_observation() {
        let mut seq = Sequence::new();
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("Action: web_search\nAction Input: comedy movies".to_string()));
        generator
            .expect_generate()
            .withf(|prompt: &str| prompt.contains("Observation: Search error:"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("Final Answer: Try Airplane!".to_string()));

        let mut search = MockWebSearch::new();
        search
            .expect_search()
            .returning(|_| Err(AppError::ExternalService("rate limited".to_string())));

        let agent = agent(Some(generator), search, MockMovieLookup::new());
        assert_eq!(agent.chat("Find me a comedy movie").await.unwrap(), "Try Airplane!");
    }

    #[tokio::test]
    async fn test_gives_up_after_max_steps() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(3)
            .returning(|_| Ok("Action: calculator\nAction Input: 2+2".to_string()));

        let agent = agent(Some(generator), MockWebSearch::new(), MockMovieLookup::new());
        let err = agent.chat("What is 2+2?").await.unwrap_err();
        assert!(matches!(err, AppError::ExternalService(_)));
    }

    #[tokio::test]
    async fn test_generator_error_propagates() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(AppError::ExternalService("503".to_string())));

        let agent = agent(Some(generator), MockWebSearch::new(), MockMovieLookup::new());
        assert!(agent.chat("Tell me about Inception on IMDB").await.is_err());
    }
}
