use std::fmt;
use std::str::FromStr;

use crate::smoothie::SmoothieId;

/// Client-side routes: `/` is the list, `/{id}` edits one smoothie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    List,
    Edit(SmoothieId),
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::List => f.write_str("/"),
            Route::Edit(id) => write!(f, "/{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no route matches `{0}`")]
pub struct UnknownRoute(pub String);

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.trim();
        match path.strip_prefix('/') {
            Some("") => Ok(Route::List),
            Some(id) => id
                .parse()
                .map(Route::Edit)
                .map_err(|_| UnknownRoute(path.to_string())),
            None => Err(UnknownRoute(path.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMode {
    Push,
    /// Overwrite the current entry so going back skips it.
    Replace,
}

pub trait Navigator: Send {
    fn navigate(&mut self, to: Route, mode: NavMode);
}

/// Stack of visited routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<Route>,
}

impl History {
    pub fn at(route: Route) -> Self {
        History {
            entries: vec![route],
        }
    }

    pub fn current(&self) -> Route {
        self.entries.last().copied().unwrap_or(Route::List)
    }

    pub fn entries(&self) -> &[Route] {
        &self.entries
    }

    /// Pops the current entry, staying put on the first one.
    pub fn back(&mut self) -> Route {
        if self.entries.len() > 1 {
            self.entries.pop();
        }
        self.current()
    }
}

impl Navigator for History {
    fn navigate(&mut self, to: Route, mode: NavMode) {
        log::info!("Navigating to {} ({:?})", to, mode);
        if mode == NavMode::Replace {
            self.entries.pop();
        }
        self.entries.push(to);
    }
}
