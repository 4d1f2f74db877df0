//! `core::fmt` and `FromStr` implementations.

use crate::{Address, InvalidAddress, Network, UnknownNetwork, ADDRESS_LEN, CHECKSUM_LEN};
use core::{fmt, str};
use data_encoding::BASE32_NOPAD;

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut bytes = [0u8; 32 + CHECKSUM_LEN];
        bytes[..32].copy_from_slice(&self.0);
        bytes[32..].copy_from_slice(&self.checksum());
        BASE32_NOPAD.encode(&bytes).fmt(f)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl str::FromStr for Address {
    type Err = InvalidAddress;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ADDRESS_LEN {
            return Err(InvalidAddress::Length(s.len()));
        }
        let bytes = BASE32_NOPAD
            .decode(s.as_bytes())
            .map_err(|_| InvalidAddress::Encoding)?;
        if bytes.len() != 32 + CHECKSUM_LEN {
            return Err(InvalidAddress::ByteLength(bytes.len()));
        }
        let address = Address::from_slice(&bytes[..32])?;
        if address.checksum()[..] != bytes[32..] {
            return Err(InvalidAddress::Checksum);
        }
        Ok(address)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl str::FromStr for Network {
    type Err = UnknownNetwork;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}
