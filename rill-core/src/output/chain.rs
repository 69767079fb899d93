//! Per-channel interception chain.
//!
//! An ordered list of observers that taps the stamped element stream on
//! a channel, independent of the stage's encode/transmit path. Each
//! link decides for itself whether the walk continues, which allows
//! links that consume-and-stop, observe-and-pass, or fan out. This is
//! the extension point for cross-cutting per-element behavior such as
//! metrics taps or replicated output.

use crate::element::SequencedElement;

/// Whether the chain walk continues past the current link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainAction {
    /// Hand the element to the next link.
    Continue,
    /// Consume the element; later links never see it.
    Stop,
}

/// A single chain link.
pub trait Interceptor<T>: Send {
    /// Observe one stamped element on `channel` and decide whether the
    /// walk continues.
    ///
    /// # Errors
    /// A link failure aborts the walk and is surfaced to the caller.
    fn accept(&mut self, element: &SequencedElement<T>, channel: usize)
        -> crate::Result<ChainAction>;

    /// Called once per channel when no further elements will arrive on
    /// it.
    ///
    /// # Errors
    /// A link failure is surfaced to the caller.
    fn end_of_stream(&mut self, channel: usize) -> crate::Result<()> {
        let _ = channel;
        Ok(())
    }
}

/// An ordered, owned sequence of links walked in push order.
pub struct InterceptorChain<T> {
    links: Vec<Box<dyn Interceptor<T>>>,
}

impl<T> InterceptorChain<T> {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self { links: Vec::new() }
    }

    /// Append a link to the end of the chain.
    pub fn push(&mut self, link: Box<dyn Interceptor<T>>) {
        self.links.push(link);
    }

    /// Number of links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the chain has no links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Walk the chain with one element, stopping at the first link that
    /// returns [`ChainAction::Stop`].
    ///
    /// # Errors
    /// The first link failure aborts the walk.
    pub fn accept(&mut self, element: &SequencedElement<T>, channel: usize) -> crate::Result<()> {
        for link in &mut self.links {
            if link.accept(element, channel)? == ChainAction::Stop {
                break;
            }
        }
        Ok(())
    }

    /// Notify every link that `channel` is finished.
    ///
    /// # Errors
    /// The first link failure aborts the notification walk.
    pub fn end_of_stream(&mut self, channel: usize) -> crate::Result<()> {
        for link in &mut self.links {
            link.end_of_stream(channel)?;
        }
        Ok(())
    }
}

impl<T> Default for InterceptorChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for InterceptorChain<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain").field("links", &self.links.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{StreamElement, StreamRecord, TransportMeta, Watermark};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingLink {
        seen: Arc<AtomicUsize>,
        finished: Arc<AtomicUsize>,
        action: ChainAction,
    }

    impl Interceptor<u32> for CountingLink {
        fn accept(
            &mut self,
            _element: &SequencedElement<u32>,
            _channel: usize,
        ) -> crate::Result<ChainAction> {
            self.seen.fetch_add(1, Ordering::Relaxed);
            Ok(self.action)
        }

        fn end_of_stream(&mut self, _channel: usize) -> crate::Result<()> {
            self.finished.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn element() -> SequencedElement<u32> {
        SequencedElement::new(
            StreamElement::Record(StreamRecord::new(7)),
            TransportMeta::default(),
        )
    }

    fn counting(action: ChainAction) -> (Box<dyn Interceptor<u32>>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let seen = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let link = Box::new(CountingLink {
            seen: Arc::clone(&seen),
            finished: Arc::clone(&finished),
            action,
        });
        (link, seen, finished)
    }

    #[test]
    fn test_walk_in_order_until_stop() {
        let mut chain = InterceptorChain::new();
        let (first, first_seen, _) = counting(ChainAction::Continue);
        let (second, second_seen, _) = counting(ChainAction::Stop);
        let (third, third_seen, _) = counting(ChainAction::Continue);
        chain.push(first);
        chain.push(second);
        chain.push(third);

        chain.accept(&element(), 0).unwrap();

        assert_eq!(first_seen.load(Ordering::Relaxed), 1);
        assert_eq!(second_seen.load(Ordering::Relaxed), 1);
        assert_eq!(third_seen.load(Ordering::Relaxed), 0, "stop must shadow later links");
    }

    #[test]
    fn test_end_of_stream_reaches_every_link() {
        let mut chain = InterceptorChain::new();
        let (first, _, first_finished) = counting(ChainAction::Stop);
        let (second, _, second_finished) = counting(ChainAction::Continue);
        chain.push(first);
        chain.push(second);

        chain.end_of_stream(3).unwrap();

        // Unlike accept, end-of-stream is not short-circuited by Stop.
        assert_eq!(first_finished.load(Ordering::Relaxed), 1);
        assert_eq!(second_finished.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_empty_chain_is_a_noop() {
        let mut chain: InterceptorChain<u32> = InterceptorChain::new();
        assert!(chain.is_empty());
        chain.accept(&element(), 0).unwrap();
        chain.end_of_stream(0).unwrap();
    }

    #[test]
    fn test_chain_sees_watermarks_too() {
        let mut chain = InterceptorChain::new();
        let (link, seen, _) = counting(ChainAction::Continue);
        chain.push(link);

        let mark = SequencedElement::new(
            StreamElement::Watermark(Watermark::new(10)),
            TransportMeta::default(),
        );
        chain.accept(&mark, 1).unwrap();
        assert_eq!(seen.load(Ordering::Relaxed), 1);
    }
}
