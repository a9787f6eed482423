use diesel_async::{
    pooled_connection::{
        deadpool::{BuildError, Object, Pool, PoolError},
        AsyncDieselConnectionManager,
    },
    AsyncPgConnection,
};
use rocket::figment::Figment;
use rocket_db_pools::{Database, Error};

use crate::db::connection;

pub type InitError = BuildError;
pub type GetError = PoolError;
pub type Connection = AsyncPgConnection;
pub struct DBPool(Pool<Connection>);

#[rocket::async_trait]
impl rocket_db_pools::Pool for DBPool {
    type Connection = Object<Connection>;

    type Error = Error<InitError, GetError>;

    async fn init(figment: &Figment) -> Result<Self, Self::Error> {
        let config = figment
            .extract::<rocket_db_pools::Config>()
            .map_err(Error::Config)?;
        let manager = AsyncDieselConnectionManager::<Connection>::new(config.url);
        Pool::builder(manager)
            .max_size(config.max_connections)
            .build()
            .map(Self)
            .map_err(Error::Init)
    }

    async fn get(&self) -> Result<Self::Connection, Self::Error> {
        let mut conn = self.0.get().await.map_err(Error::Get)?;
        connection::instrument(&mut conn);
        Ok(conn)
    }

    async fn close(&self) {
        self.0.close()
    }
}

#[derive(Database)]
#[database("main")]
pub struct Db(DBPool);
