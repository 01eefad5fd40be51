#[macro_use]
mod macros;

agg_mod![db, error, models, schemas];
