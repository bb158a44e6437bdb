//! Handler trait and type erasure.
//!
//! # How typed handlers are stored
//!
//! Every route has its own input and output types, yet the router holds all
//! of them in one `Vec`. The typed function is wrapped once, at
//! registration, in an adapter that speaks plain JSON on both sides:
//!
//! ```text
//! async fn get_pet(input: PetId) -> Result<Pet, E>   ← user writes this
//!        ↓ spec.handler(get_pet)
//! get_pet.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler { f: get_pet, .. })             ← heap-allocated adapter
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(validated_json)  at request time      ← one vtable dispatch
//!        ↓
//! from_value::<PetId> → get_pet(..).await → to_value(Pet)
//! ```
//!
//! The JSON handed to `call` has already passed the route's input schema;
//! the JSON it returns still has to pass the output schema.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::BoxError;

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased handler future.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Result<Value, BoxError>> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, input: Value) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any async function
/// of one of these shapes:
///
/// ```text
/// async fn name(input: I) -> Result<O, E>
/// async fn name()         -> Result<O, E>
/// ```
///
/// where `I: Deserialize`, `O: Serialize` and `E` converts into
/// [`BoxError`]. `serde_json::Value` works for both `I` and `O`.
///
/// `Args` only exists to keep the two blanket impls apart; it is inferred.
/// The trait is sealed: only the blanket impls below can satisfy it.
pub trait Handler<Args>: private::Sealed<Args> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed<Args> {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, I, O, E> private::Sealed<(I,)> for F
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
}

impl<F, Fut, I, O, E> Handler<(I,)> for F
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler { f: self, _input: PhantomData })
    }
}

impl<F, Fut, O, E> private::Sealed<()> for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    O: Serialize + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
}

/// Handlers without input ignore the validated value entirely.
impl<F, Fut, O, E> Handler<()> for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    O: Serialize + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(NoInputHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Holds a concrete handler `F` and bridges it to [`ErasedHandler`].
///
/// `fn(I)` in the marker keeps the wrapper `Send + Sync` whatever `I` is.
struct FnHandler<F, I> {
    f: F,
    _input: PhantomData<fn(I)>,
}

impl<F, Fut, I, O, E> ErasedHandler for FnHandler<F, I>
where
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    I: DeserializeOwned,
    O: Serialize + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    fn call(&self, input: Value) -> BoxFuture {
        // The schema accepted this value; failing to read it as `I` means the
        // schema and the handler disagree, which is a server-side bug.
        let input: I = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(e) => return Box::pin(async move { Err::<Value, BoxError>(e.into()) }),
        };
        finish((self.f)(input))
    }
}

struct NoInputHandler<F>(F);

impl<F, Fut, O, E> ErasedHandler for NoInputHandler<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    O: Serialize + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    fn call(&self, _input: Value) -> BoxFuture {
        finish((self.0)())
    }
}

fn finish<Fut, O, E>(fut: Fut) -> BoxFuture
where
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    O: Serialize + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    Box::pin(async move {
        let output = fut.await.map_err(Into::<BoxError>::into)?;
        Ok::<Value, BoxError>(serde_json::to_value(output)?)
    })
}
