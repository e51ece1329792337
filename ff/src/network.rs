//! Game state reads from the chain
//!
//! The polled reads (game data, cards) go through a [`ThrottledFetch`] each, so
//! a polling loop gets `Ok(None)` when a read was throttled or superseded by a
//! newer one. The deck is read once per game and is not throttled.

use std::sync::Arc;

use async_trait::async_trait;
use fetchgate::{FetchFuture, FetchStats, ThrottledFetch};
use tracing::debug;

use crate::chain::{Address, CallOutput, GameId, encode_call, word_from_address, word_from_u128};
use crate::config::{Config, DeploymentConfig, ThrottleSettings};
use crate::rpc::{ReadError, RpcClient};

const FETCH_GAME_DATA: &str = "fetchGameData(uint256)";
const GET_CARDS: &str = "getCards(uint256)";
const GET_DECK: &str = "getDeck(address,uint8)";

/// Raw contract reads for one deployment
#[async_trait]
pub trait GameReader: Send + Sync {
    /// Full game data for the game
    async fn fetch_game_data(&self, game_id: GameId) -> Result<CallOutput, ReadError>;

    /// Card IDs in play for the game
    async fn get_cards(&self, game_id: GameId) -> Result<CallOutput, ReadError>;

    /// A player's deck from the inventory
    async fn get_deck(&self, player: Address, deck_id: u8) -> Result<CallOutput, ReadError>;
}

/// [`GameReader`] backed by `eth_call` against the Game and Inventory contracts
pub struct ContractGameReader {
    rpc: RpcClient,
    deployment: DeploymentConfig,
}

impl ContractGameReader {
    pub fn new(rpc: RpcClient, deployment: DeploymentConfig) -> Self {
        debug!(game = %deployment.game, inventory = %deployment.inventory, "ContractGameReader::new: called");
        Self { rpc, deployment }
    }

    /// Build the reader from a validated configuration
    pub fn from_config(config: &Config) -> Result<Self, ReadError> {
        debug!("ContractGameReader::from_config: called");
        let rpc = RpcClient::from_config(&config.rpc)?;
        Ok(Self::new(rpc, config.deployment.clone()))
    }
}

#[async_trait]
impl GameReader for ContractGameReader {
    async fn fetch_game_data(&self, game_id: GameId) -> Result<CallOutput, ReadError> {
        debug!(%game_id, "ContractGameReader::fetch_game_data: called");
        let data = encode_call(FETCH_GAME_DATA, &[game_id.to_word()]);
        self.rpc.eth_call(self.deployment.game, &data).await
    }

    async fn get_cards(&self, game_id: GameId) -> Result<CallOutput, ReadError> {
        debug!(%game_id, "ContractGameReader::get_cards: called");
        let data = encode_call(GET_CARDS, &[game_id.to_word()]);
        self.rpc.eth_call(self.deployment.game, &data).await
    }

    async fn get_deck(&self, player: Address, deck_id: u8) -> Result<CallOutput, ReadError> {
        debug!(%player, deck_id, "ContractGameReader::get_deck: called");
        let data = encode_call(GET_DECK, &[word_from_address(&player), word_from_u128(deck_id.into())]);
        self.rpc.eth_call(self.deployment.inventory, &data).await
    }
}

/// Throttled, zombie-filtered access to the polled game reads
#[derive(Clone)]
pub struct GameFeed {
    reader: Arc<dyn GameReader>,
    game_data: ThrottledFetch<GameId, CallOutput, ReadError>,
    cards: ThrottledFetch<GameId, CallOutput, ReadError>,
}

impl GameFeed {
    pub fn new(reader: Arc<dyn GameReader>, settings: &ThrottleSettings) -> Self {
        debug!(?settings, "GameFeed::new: called");

        let game_data_reader = Arc::clone(&reader);
        let game_data = ThrottledFetch::new(
            move |game_id: GameId| {
                let reader = Arc::clone(&game_data_reader);
                async move { reader.fetch_game_data(game_id).await }
            },
            settings.game_data.clone(),
        );

        let cards_reader = Arc::clone(&reader);
        let cards = ThrottledFetch::new(
            move |game_id: GameId| {
                let reader = Arc::clone(&cards_reader);
                async move { reader.get_cards(game_id).await }
            },
            settings.cards.clone(),
        );

        Self {
            reader,
            game_data,
            cards,
        }
    }

    /// Game data, or `None` if throttled or superseded by a newer read
    pub fn fetch_game_data(&self, game_id: GameId) -> FetchFuture<CallOutput, ReadError> {
        debug!(%game_id, "GameFeed::fetch_game_data: called");
        self.game_data.fetch(game_id)
    }

    /// Cards in play, or `None` if throttled or superseded by a newer read
    pub fn fetch_cards(&self, game_id: GameId) -> FetchFuture<CallOutput, ReadError> {
        debug!(%game_id, "GameFeed::fetch_cards: called");
        self.cards.fetch(game_id)
    }

    /// Only read once at the start of a game, so no throttling or zombie filtering
    pub async fn fetch_deck(&self, player: Address, deck_id: u8) -> Result<CallOutput, ReadError> {
        debug!(%player, deck_id, "GameFeed::fetch_deck: called");
        self.reader.get_deck(player, deck_id).await
    }

    pub fn game_data_stats(&self) -> FetchStats {
        self.game_data.stats()
    }

    pub fn cards_stats(&self) -> FetchStats {
        self.cards.stats()
    }
}
