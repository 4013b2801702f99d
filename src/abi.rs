//! Typed bindings of the betting oracle and the profile registry

use alloy::sol;

sol! {
    #![sol(all_derives)]

    /// On-chain event record as returned by `getEvent`
    #[sol(all_derives)]
    struct EventData {
        string question;
        string description;
        string category;
        string imageUrl;
        uint256 bettingStopDate;
        uint256 resolutionDate;
        uint256 minStake;
        uint256 maxStake;
        uint8 status;
        uint256 yesPool;
        uint256 noPool;
        uint8 winningOutcome;
    }

    /// Stakes of one address on one event
    #[sol(all_derives)]
    struct BetPosition {
        uint256 yesAmount;
        uint256 noAmount;
        bool claimed;
    }

    /// Registry record of one address
    #[sol(all_derives)]
    struct Profile {
        string username;
        string bio;
        string twitterHandle;
        string websiteUrl;
    }

    /// Events and betting oracle
    #[sol(all_derives)]
    interface IBettingOracle {
        function nextEventId() external view returns (uint256);
        function platformFeeBps() external view returns (uint256);
        function getEvent(uint256 id) external view returns (EventData memory);
        function getUserBet(uint256 id, address user) external view returns (BetPosition memory);

        function createEvent(
            string calldata question,
            string calldata description,
            string calldata category,
            string calldata imageUrl,
            uint256 bettingStopDate,
            uint256 resolutionDate,
            uint256 minStake,
            uint256 maxStake
        ) external returns (uint256);
        function placeBet(uint256 id, bool outcome) external payable;
        function resolveEvent(uint256 id, bool outcome) external;
        function cancelEvent(uint256 id) external;
        function claim(uint256 id) external;

        event EventCreated(uint256 indexed id, address indexed creator, string question);
        event BetPlaced(uint256 indexed eventId, address indexed user, bool outcome, uint256 amount);
        event WinningsClaimed(uint256 indexed eventId, address indexed user, uint256 amount);
        event EventCanceled(uint256 indexed eventId);
    }

    /// Address-keyed user profiles
    #[sol(all_derives)]
    interface IUserProfileRegistry {
        function getProfile(address user) external view returns (Profile memory);
        function setProfile(
            string calldata username,
            string calldata bio,
            string calldata twitterHandle,
            string calldata websiteUrl
        ) external;
    }
}
