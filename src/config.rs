// Configuration: everything the CLI needs to know about the outside world,
// read once from environment variables with sensible defaults.

use std::time::Duration;

pub const DEFAULT_WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_GOOGLE_IMAGES_URL: &str = "http://www.google.com/images";

/// Base URLs of the two search backends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub wikipedia_api: String,
    pub google_images: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            wikipedia_api: DEFAULT_WIKIPEDIA_API_URL.into(),
            google_images: DEFAULT_GOOGLE_IMAGES_URL.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub endpoints: Endpoints,
    pub user_agent: String,
    /// `None` leaves requests without a timeout.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoints: Endpoints::default(),
            user_agent: default_user_agent(),
            timeout: None,
        }
    }
}

impl Config {
    /// Build a configuration from `WIKIPEDIA_API_URL`, `GOOGLE_IMAGES_URL`,
    /// `IMAGE_LOOKUP_USER_AGENT` and `IMAGE_LOOKUP_TIMEOUT_SECS`, falling
    /// back to the defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads variables through `lookup`, which keeps
    /// tests away from the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout = non_empty("IMAGE_LOOKUP_TIMEOUT_SECS").and_then(|raw| {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    log::warn!("Ignoring invalid IMAGE_LOOKUP_TIMEOUT_SECS value {:?}", raw);
                    None
                }
            }
        });

        Config {
            endpoints: Endpoints {
                wikipedia_api: non_empty("WIKIPEDIA_API_URL")
                    .unwrap_or(defaults.endpoints.wikipedia_api),
                google_images: non_empty("GOOGLE_IMAGES_URL")
                    .unwrap_or(defaults.endpoints.google_images),
            },
            user_agent: non_empty("IMAGE_LOOKUP_USER_AGENT").unwrap_or(defaults.user_agent),
            timeout,
        }
    }
}

fn default_user_agent() -> String {
    format!("image-lookup-cli/{}", env!("CARGO_PKG_VERSION"))
}
