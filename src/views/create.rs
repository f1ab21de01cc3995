use crate::error::FormError;
use crate::navigation::{NavMode, Navigator, Route};
use crate::smoothie::Smoothie;
use crate::store::SmoothieStore;
use crate::views::form::SmoothieForm;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateView {
    pub form: SmoothieForm,
    form_error: Option<String>,
}

impl CreateView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    /// Inserts the form as a new smoothie and goes back to the list.
    ///
    /// Nothing reaches the store unless every field is filled in.
    pub async fn submit(
        &mut self,
        store: &dyn SmoothieStore,
        nav: &mut dyn Navigator,
    ) -> Result<Smoothie, FormError> {
        let result = match self.form.validate() {
            Ok(smoothie) => store.insert(&smoothie).await.map_err(FormError::from),
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(created) => {
                log::info!("Created smoothie {} ({})", created.id, created.title);
                self.form_error = None;
                nav.navigate(Route::List, NavMode::Push);
                Ok(created)
            }
            Err(e) => {
                log::error!("Could not create smoothie: {}", e);
                self.form_error = Some(e.user_message());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::History;
    use crate::smoothie::OrderBy;
    use crate::store::testing::FlakyStore;
    use crate::views::form::Field;
    use crate::views::list::ListView;

    fn filled(title: &str, method: &str, rating: &str) -> CreateView {
        let mut view = CreateView::new();
        view.form.set(Field::Title, title);
        view.form.set(Field::Method, method);
        view.form.set(Field::Rating, rating);
        view
    }

    #[tokio::test]
    async fn valid_submit_inserts_once_and_returns_to_the_list() {
        let store = FlakyStore::new();
        let mut history = History::at(Route::List);
        let mut view = filled("Peach Party", "Blend peaches with yoghurt", "8");

        let created = view.submit(&store, &mut history).await.unwrap();
        assert_eq!(store.calls(), 1);
        assert!(view.form_error().is_none());
        assert_eq!(history.current(), Route::List);
        assert_eq!(history.entries().len(), 2);

        let mut list = ListView::new();
        list.mount(&store).await;
        assert_eq!(list.smoothies(), &[created]);
        assert_eq!(list.smoothies()[0].rating, 8);
    }

    #[tokio::test]
    async fn empty_field_never_reaches_the_store() {
        let store = FlakyStore::new();
        let mut history = History::at(Route::List);

        for mut view in [
            filled("", "Blend", "8"),
            filled("Peach", "", "8"),
            filled("Peach", "Blend", ""),
        ] {
            let result = view.submit(&store, &mut history).await;
            assert!(matches!(result, Err(FormError::Validation(_))));
            assert_eq!(
                view.form_error(),
                Some("Please fill in all the fields correctly")
            );
        }
        assert_eq!(store.calls(), 0);
        assert_eq!(history.entries(), &[Route::List]);
    }

    #[tokio::test]
    async fn backend_failure_keeps_the_form_with_its_cause() {
        let store = FlakyStore::new();
        store.fail(true);
        let mut history = History::at(Route::List);
        let mut view = filled("Peach Party", "Blend", "8");

        assert!(matches!(
            view.submit(&store, &mut history).await,
            Err(FormError::Network(_))
        ));
        assert_eq!(
            view.form_error(),
            Some("Could not reach the smoothie service, please try again")
        );
        assert_eq!(view.form.title, "Peach Party");
        assert_eq!(history.entries().len(), 1);

        store.fail(false);
        view.submit(&store, &mut history).await.unwrap();
        assert!(view.form_error().is_none());
        assert_eq!(store.inner.list(OrderBy::Title).await.unwrap().len(), 1);
    }
}
