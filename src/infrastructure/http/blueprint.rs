use crate::context::AppState;
use axum::Router;

/// Named route inside a blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub name: &'static str,
    pub path: &'static str,
}

impl Endpoint {
    pub const fn new(name: &'static str, path: &'static str) -> Self {
        Self { name, path }
    }
}

/// Self-contained feature module: a route group plus the CLI commands it
/// contributes.
#[derive(Clone, Copy)]
pub struct Blueprint {
    pub name: &'static str,
    pub endpoints: &'static [Endpoint],
    pub commands: &'static [&'static str],
    routes: fn() -> Router<AppState>,
}

impl Blueprint {
    pub const fn new(name: &'static str, routes: fn() -> Router<AppState>) -> Self {
        Self {
            name,
            endpoints: &[],
            commands: &[],
            routes,
        }
    }

    pub const fn with_endpoints(mut self, endpoints: &'static [Endpoint]) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub const fn with_commands(mut self, commands: &'static [&'static str]) -> Self {
        self.commands = commands;
        self
    }

    pub fn routes(&self) -> Router<AppState> {
        (self.routes)()
    }
}

#[derive(Clone)]
pub struct RegisteredBlueprint {
    pub blueprint: Blueprint,
    pub url_prefix: Option<String>,
}

impl RegisteredBlueprint {
    pub fn name(&self) -> &'static str {
        self.blueprint.name
    }

    /// Full path of one of the blueprint's endpoint paths.
    pub fn full_path(&self, path: &str) -> String {
        match self.url_prefix.as_deref() {
            Some(prefix) if path == "/" => prefix.to_string(),
            Some(prefix) => format!("{}{}", prefix, path),
            None => path.to_string(),
        }
    }
}

/// Blueprints in registration order.
#[derive(Clone, Default)]
pub struct RouteRegistry {
    blueprints: Vec<RegisteredBlueprint>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        blueprint: Blueprint,
        url_prefix: Option<&str>,
    ) -> Result<(), RegistrationError> {
        if self.get(blueprint.name).is_some() {
            return Err(RegistrationError::DuplicateName(blueprint.name));
        }

        let url_prefix = match url_prefix {
            Some(prefix) if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') => {
                return Err(RegistrationError::InvalidPrefix(prefix.to_string()))
            }
            other => other.map(str::to_string),
        };

        tracing::debug!(
            "Registered blueprint {} at {}",
            blueprint.name,
            url_prefix.as_deref().unwrap_or("/")
        );
        self.blueprints.push(RegisteredBlueprint {
            blueprint,
            url_prefix,
        });
        Ok(())
    }

    pub fn blueprints(&self) -> &[RegisteredBlueprint] {
        &self.blueprints
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.blueprints.iter().map(RegisteredBlueprint::name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredBlueprint> {
        self.blueprints.iter().find(|bp| bp.name() == name)
    }

    /// Resolves `blueprint.endpoint` to its path; the first path wins when an
    /// endpoint is mounted more than once.
    pub fn url_for(&self, endpoint: &str) -> Option<String> {
        let (blueprint, name) = endpoint.split_once('.')?;
        let registered = self.get(blueprint)?;
        registered
            .blueprint
            .endpoints
            .iter()
            .find(|e| e.name == name)
            .map(|e| registered.full_path(e.path))
    }

    /// Every `(endpoint, path)` pair, in registration order.
    pub fn rules(&self) -> Vec<(String, String)> {
        self.blueprints
            .iter()
            .flat_map(|registered| {
                registered.blueprint.endpoints.iter().map(move |e| {
                    (
                        format!("{}.{}", registered.name(), e.name),
                        registered.full_path(e.path),
                    )
                })
            })
            .collect()
    }

    pub fn commands(&self) -> Vec<&'static str> {
        self.blueprints
            .iter()
            .flat_map(|registered| registered.blueprint.commands.iter().copied())
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("A blueprint named {0} is already registered")]
    DuplicateName(&'static str),

    #[error("Invalid URL prefix: {0}")]
    InvalidPrefix(String),
}
