//! Pets API — create, list and fetch pets from an in-memory store.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example pets
//!
//! Try:
//!   curl -X POST http://localhost:5000/pets \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"Eloise"}'
//!   curl http://localhost:5000/pets
//!   curl http://localhost:5000/pets/1
//!   curl -X POST http://localhost:5000/pets -d '{"name":42}'   # 400

use std::sync::Arc;

use http::StatusCode;
use parking_lot::Mutex;
use schemaroute::schema::{JsonSchema, Typed, array, object, string};
use schemaroute::{BoxError, Dispatcher, Method, RouteSpec, Router, Server, context};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Deserialize, Serialize)]
struct Pet {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct NewPet {
    name: String,
}

#[derive(Deserialize)]
struct PetId {
    id: String,
}

#[derive(Default)]
struct Store {
    pets: Mutex<Vec<Pet>>,
}

impl Store {
    fn create(&self, name: String) -> Pet {
        let mut pets = self.pets.lock();
        let pet = Pet { id: (pets.len() + 1).to_string(), name };
        pets.push(pet.clone());
        pet
    }

    fn all(&self) -> Vec<Pet> {
        self.pets.lock().clone()
    }

    fn find(&self, id: &str) -> Result<Pet, BoxError> {
        self.pets
            .lock()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| format!("no pet with id {id}").into())
    }
}

#[tokio::main]
async fn main() -> Result<(), schemaroute::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store = Arc::new(Store::default());
    let pet = || object([("id", string()), ("name", string())]);

    // POST /pets → 201, input described as JSON Schema
    let new_pet = JsonSchema::new(json!({
        "type": "object",
        "required": ["name"],
        "properties": { "name": { "type": "string", "minLength": 1 } },
    }))?;
    let create = {
        let store = Arc::clone(&store);
        RouteSpec::new(Method::Post, "/pets", new_pet, pet())?
            .handler(move |input: NewPet| {
                let store = Arc::clone(&store);
                async move {
                    context::current()?.set_status(StatusCode::CREATED);
                    Ok::<_, BoxError>(store.create(input.name))
                }
            })
    };

    // GET /pets
    let list = {
        let store = Arc::clone(&store);
        RouteSpec::new(Method::Get, "/pets", object::<_, &str>([]), array(pet()))?
            .handler(move || {
                let store = Arc::clone(&store);
                async move { Ok::<_, BoxError>(store.all()) }
            })
    };

    // GET /pets/:id — output checked against the serde type itself
    let get = {
        let store = Arc::clone(&store);
        RouteSpec::new(Method::Get, "/pets/:id", object([("id", string())]), Typed::<Pet>::new())?
            .handler(move |input: PetId| {
                let store = Arc::clone(&store);
                async move { store.find(&input.id) }
            })
    };

    let router = Router::from_routes([create, list, get])?;
    let addr = std::env::var("PETS_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_owned());

    Server::bind(&addr)?.serve(Dispatcher::new(router)).await
}
