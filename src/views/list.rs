use crate::error::{FormError, FETCH_ERROR_MESSAGE};
use crate::smoothie::{OrderBy, Smoothie, SmoothieId};
use crate::store::SmoothieStore;
use crate::views::card::SmoothieCard;

/// Outcome of the latest fetch. `Loaded` and `Errored` hold until the next one.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ListState {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<Smoothie>),
    Errored(String),
}

/// Home page: every smoothie, sorted descending by a selectable key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListView {
    order_by: OrderBy,
    state: ListState,
    notice: Option<String>,
}

impl ListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_by(&self) -> OrderBy {
        self.order_by
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    /// Message left by a failed delete.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn smoothies(&self) -> &[Smoothie] {
        match &self.state {
            ListState::Loaded(smoothies) => smoothies,
            _ => &[],
        }
    }

    pub async fn mount(&mut self, store: &dyn SmoothieStore) {
        self.fetch(store).await
    }

    /// Re-fetches only when `order_by` differs from the current key.
    pub async fn set_order(&mut self, order_by: OrderBy, store: &dyn SmoothieStore) -> bool {
        if order_by == self.order_by && self.state != ListState::Idle {
            return false;
        }
        self.order_by = order_by;
        self.fetch(store).await;
        true
    }

    async fn fetch(&mut self, store: &dyn SmoothieStore) {
        self.state = ListState::Loading;
        self.notice = None;
        self.state = match store.list(self.order_by).await {
            Ok(smoothies) => ListState::Loaded(smoothies),
            Err(e) => {
                log::error!("Could not fetch smoothies by {}: {}", self.order_by, e);
                ListState::Errored(FETCH_ERROR_MESSAGE.to_string())
            }
        };
    }

    /// Drops the entry with `id` from the local list without asking the store.
    pub fn remove(&mut self, id: SmoothieId) {
        if let ListState::Loaded(smoothies) = &mut self.state {
            smoothies.retain(|s| s.id != id);
        }
    }

    /// Deletes through the card and splices the entry out once confirmed.
    pub async fn delete(
        &mut self,
        id: SmoothieId,
        store: &dyn SmoothieStore,
    ) -> Result<(), FormError> {
        let Some(smoothie) = self.smoothies().iter().find(|s| s.id == id).cloned() else {
            let e = FormError::NotFound(id);
            self.notice = Some(e.user_message());
            return Err(e);
        };
        let result = SmoothieCard::new(&smoothie)
            .delete(store, |id| self.remove(id))
            .await;
        self.notice = result.as_ref().err().map(FormError::user_message);
        result
    }
}
