use serde::{Deserialize, Serialize};

/// Reply language selected by the user.
///
/// Drives both the system instruction sent with each request and the locale
/// used for speech output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Fr,
}

const ALL: &[Language] = &[Language::En, Language::Hi, Language::Fr];

impl Language {
    pub fn all() -> &'static [Language] {
        ALL
    }

    /// BCP 47 locale tag used to pick a speech voice.
    pub fn locale(self) -> &'static str {
        match self {
            Language::En => "en-US",
            Language::Hi => "hi-IN",
            Language::Fr => "fr-FR",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "Hindi",
            Language::Fr => "French",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Fr => "fr",
        }
    }

    /// System instruction establishing the mentor persona in this language.
    pub fn instruction(self) -> &'static str {
        match self {
            Language::En => {
                "You are an experienced career mentor. Respond in fluent English. Be helpful, concise, and motivational. Keep answers short — maximum 3 to 4 bullet points or sentences only."
            }
            Language::Hi => {
                "आप एक अनुभवी करियर मेंटर हैं। उपयोगकर्ता को हिंदी में उत्तर दें। उत्तर संक्षिप्त और प्रेरणादायक होने चाहिए — अधिकतम 3 से 4 बिंदुओं में।"
            }
            Language::Fr => {
                "Vous êtes un mentor de carrière expérimenté. Répondez en français. Soyez utile, motivant et concis — ne donnez que 3 ou 4 points ou phrases au maximum."
            }
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "hi" | "hindi" => Ok(Language::Hi),
            "fr" | "french" => Ok(Language::Fr),
            _ => Err(format!("unknown language: {}", s)),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
