//! Multi-page review collection.
//!
//! Holds the ordered pages of one capture session plus the selected index.
//! All operations take `&mut self` and notify the registered
//! [`PageObserver`] after each successful change.

use tracing::debug;

use crate::error::{FilePickerError, PageError, ValidationError};
use crate::models::config::PagesConfig;
use crate::models::document::{Document, DocumentKind};
use crate::validation::ValidatedDocument;

/// One page of the session.
#[derive(Debug, Clone)]
pub struct Page {
    pub document: Document,
    pub error: Option<ValidationError>,
    pub is_uploaded: bool,
}

impl Page {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            error: None,
            is_uploaded: false,
        }
    }
}

impl From<Document> for Page {
    fn from(document: Document) -> Self {
        Page::new(document)
    }
}

impl From<ValidatedDocument> for Page {
    fn from(validated: ValidatedDocument) -> Self {
        Self {
            document: validated.document,
            error: validated.error,
            is_uploaded: false,
        }
    }
}

/// Change notifications emitted by [`PageCollection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// `count` pages were appended starting at `start`.
    Appended { start: usize, count: usize },
    Deleted { index: usize },
    Moved { from: usize, to: usize },
    Rotated { index: usize },
    Selected { index: usize },
    /// The last page was deleted.
    Emptied,
}

/// Receives [`PageEvent`]s.
pub trait PageObserver {
    fn on_event(&mut self, event: &PageEvent);
}

impl<F> PageObserver for F
where
    F: FnMut(&PageEvent),
{
    fn on_event(&mut self, event: &PageEvent) {
        self(event)
    }
}

/// Ordered pages with a selection.
pub struct PageCollection {
    pages: Vec<Page>,
    selected: Option<usize>,
    max_pages: usize,
    observer: Option<Box<dyn PageObserver>>,
}

impl std::fmt::Debug for PageCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCollection")
            .field("pages", &self.pages)
            .field("selected", &self.selected)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

impl Default for PageCollection {
    fn default() -> Self {
        Self::new(&PagesConfig::default())
    }
}

impl PageCollection {
    /// Create an empty collection. With multipage disabled only one page fits.
    pub fn new(config: &PagesConfig) -> Self {
        let max_pages = if config.multipage_enabled {
            config.max_pages
        } else {
            1
        };

        Self {
            pages: Vec::new(),
            selected: None,
            max_pages,
            observer: None,
        }
    }

    /// Register the observer notified after each change.
    pub fn with_observer(mut self, observer: impl PageObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_mut(&mut self, at: usize) -> Option<&mut Page> {
        self.pages.get_mut(at)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.pages.iter().map(|page| &page.document)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_page(&self) -> Option<&Page> {
        self.selected.and_then(|i| self.pages.get(i))
    }

    /// Append pages and select the first of them.
    pub fn append<P: Into<Page>>(&mut self, pages: impl IntoIterator<Item = P>) -> Result<(), PageError> {
        let pages: Vec<Page> = pages.into_iter().map(Into::into).collect();
        if pages.is_empty() {
            return Ok(());
        }

        let attempted = self.pages.len() + pages.len();
        if attempted > self.max_pages {
            return Err(PageError::MaxPagesExceeded {
                max: self.max_pages,
                attempted,
            });
        }

        let start = self.pages.len();
        let count = pages.len();
        self.pages.extend(pages);
        self.selected = Some(start);

        debug!(start, count, "Appended pages");
        self.notify(PageEvent::Appended { start, count });
        Ok(())
    }

    /// Remove and return the page at `at`.
    ///
    /// The page now at `at` (or the new last page) becomes selected.
    pub fn delete(&mut self, at: usize) -> Result<Page, PageError> {
        self.check_index(at)?;

        let page = self.pages.remove(at);
        debug!(index = at, remaining = self.pages.len(), "Deleted page");
        self.notify(PageEvent::Deleted { index: at });

        if self.pages.is_empty() {
            self.selected = None;
            self.notify(PageEvent::Emptied);
        } else {
            self.selected = Some(at.min(self.pages.len() - 1));
        }

        Ok(page)
    }

    /// Move the page at `from` to `to`, shifting the pages in between.
    ///
    /// The selected page stays selected at its new position.
    pub fn move_page(&mut self, from: usize, to: usize) -> Result<(), PageError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }

        let page = self.pages.remove(from);
        self.pages.insert(to, page);

        self.selected = self.selected.map(|selected| {
            if selected == from {
                to
            } else if from < selected && selected <= to {
                selected - 1
            } else if to <= selected && selected < from {
                selected + 1
            } else {
                selected
            }
        });

        debug!(from, to, "Moved page");
        self.notify(PageEvent::Moved { from, to });
        Ok(())
    }

    /// Rotate the image page at `at` by 90 degrees clockwise and select it.
    pub fn rotate(&mut self, at: usize) -> Result<(), PageError> {
        self.check_index(at)?;

        match &mut self.pages[at].document {
            Document::Image(image) => image.rotate(90),
            _ => return Err(PageError::NotRotatable(at)),
        }

        self.selected = Some(at);
        self.notify(PageEvent::Rotated { index: at });
        Ok(())
    }

    pub fn select(&mut self, at: usize) -> Result<(), PageError> {
        self.check_index(at)?;
        self.selected = Some(at);
        self.notify(PageEvent::Selected { index: at });
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), PageError> {
        if index >= self.pages.len() {
            return Err(PageError::IndexOutOfBounds {
                index,
                len: self.pages.len(),
            });
        }
        Ok(())
    }

    fn notify(&mut self, event: PageEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer.on_event(&event);
        }
    }
}

/// Reject imports that mix images and PDFs.
pub fn ensure_single_kind<'a>(
    documents: impl IntoIterator<Item = &'a Document>,
) -> Result<(), FilePickerError> {
    let mut seen: Option<DocumentKind> = None;
    for document in documents {
        let kind = document.kind();
        if kind == DocumentKind::QrCode {
            continue;
        }
        match seen {
            Some(previous) if previous != kind => {
                return Err(FilePickerError::MixedDocumentsUnsupported);
            }
            _ => seen = Some(kind),
        }
    }
    Ok(())
}
