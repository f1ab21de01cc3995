use crate::error::FormError;
use crate::navigation::{NavMode, Navigator, Route};
use crate::smoothie::{Smoothie, SmoothieId};
use crate::store::SmoothieStore;
use crate::views::form::SmoothieForm;

/// Edit page for one smoothie, reached at `/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateView {
    id: SmoothieId,
    pub form: SmoothieForm,
    form_error: Option<String>,
}

impl UpdateView {
    /// Loads the smoothie and pre-fills the form.
    ///
    /// When the smoothie cannot be loaded the list replaces the edit page in
    /// the history and no view is returned.
    pub async fn mount(
        id: SmoothieId,
        store: &dyn SmoothieStore,
        nav: &mut dyn Navigator,
    ) -> Option<UpdateView> {
        match store.fetch(id).await {
            Ok(smoothie) => Some(UpdateView {
                id,
                form: SmoothieForm::from(&smoothie),
                form_error: None,
            }),
            Err(e) => {
                log::warn!("Could not load smoothie {}: {}", id, e);
                nav.navigate(Route::List, NavMode::Replace);
                None
            }
        }
    }

    pub fn id(&self) -> SmoothieId {
        self.id
    }

    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    pub async fn submit(
        &mut self,
        store: &dyn SmoothieStore,
        nav: &mut dyn Navigator,
    ) -> Result<Smoothie, FormError> {
        let result = match self.form.validate() {
            Ok(smoothie) => match store.update(self.id, &smoothie).await {
                Ok(rows) => rows.into_iter().next().ok_or(FormError::NotFound(self.id)),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(updated) => {
                log::info!("Updated smoothie {}", updated.id);
                self.form_error = None;
                nav.navigate(Route::List, NavMode::Push);
                Ok(updated)
            }
            Err(e) => {
                log::error!("Could not update smoothie {}: {}", self.id, e);
                self.form_error = Some(e.user_message());
                Err(e)
            }
        }
    }
}
