//! Native error codes understood by the bridge.
//!
//! The connector reports failures as a bare unsigned integer. `ErrorCode` is the
//! closed set of codes the bridge knows how to name: every client-side code from
//! libmysqlclient's `errmsg.h` (2000-2061) and the server codes the embedded
//! engine emits. Anything else stays a raw number and surfaces as
//! `BridgeError::Unrepresentable`.

macro_rules! error_codes {
    ($($code:literal => $name:ident, $text:literal;)+) => {
        /// A known native error code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum ErrorCode {
            $(
                #[doc = $text]
                $name = $code,
            )+
        }

        impl ErrorCode {
            /// Every known code, in ascending numeric order.
            pub const ALL: &'static [ErrorCode] = &[$(ErrorCode::$name),+];

            /// Looks up a native code, returning `None` for codes outside the known set.
            pub fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(ErrorCode::$name),)+
                    _ => None,
                }
            }

            /// Default description used when the connector gives no message.
            pub fn description(self) -> &'static str {
                match self {
                    $(ErrorCode::$name => $text,)+
                }
            }
        }
    };
}

error_codes! {
    1007 => DatabaseCreateExists, "Can't create database; database exists";
    1008 => DatabaseDropExists, "Can't drop database; database doesn't exist";
    1044 => DatabaseAccessDenied, "Access denied for user to database";
    1045 => AccessDenied, "Access denied for user";
    1046 => NoDatabaseSelected, "No database selected";
    1049 => BadDatabase, "Unknown database";
    1050 => TableExists, "Table already exists";
    1051 => BadTable, "Unknown table";
    1054 => BadField, "Unknown column";
    1062 => DuplicateEntry, "Duplicate entry for key";
    1064 => ParseError, "You have an error in your SQL syntax";
    1065 => EmptyQuery, "Query was empty";
    1102 => WrongDatabaseName, "Incorrect database name";
    1105 => UnknownServerError, "Unknown error";
    1146 => NoSuchTable, "Table doesn't exist";
    2000 => UnknownError, "Unknown MySQL error";
    2001 => SocketCreateError, "Can't create UNIX socket";
    2002 => ConnectionError, "Can't connect to local MySQL server through socket";
    2003 => ConnHostError, "Can't connect to MySQL server on host";
    2004 => IpSockError, "Can't create TCP/IP socket";
    2005 => UnknownHost, "Unknown MySQL server host";
    2006 => ServerGone, "MySQL server has gone away";
    2007 => VersionError, "Protocol mismatch";
    2008 => OutOfMemory, "MySQL client ran out of memory";
    2009 => WrongHostInfo, "Wrong host info";
    2010 => LocalhostConnection, "Localhost via UNIX socket";
    2011 => TcpConnection, "Host via TCP/IP";
    2012 => ServerHandshakeError, "Error in server handshake";
    2013 => ServerLost, "Lost connection to MySQL server during query";
    2014 => CommandsOutOfSync, "Commands out of sync; you can't run this command now";
    2015 => NamedPipeConnection, "Named pipe connection";
    2016 => NamedPipeWaitError, "Can't wait for named pipe";
    2017 => NamedPipeOpenError, "Can't open named pipe";
    2018 => NamedPipeSetStateError, "Can't set state of named pipe";
    2019 => CantReadCharset, "Can't initialize character set";
    2020 => NetPacketTooLarge, "Got packet bigger than 'max_allowed_packet' bytes";
    2021 => EmbeddedConnection, "Embedded server";
    2022 => ProbeSlaveStatus, "Error on SHOW SLAVE STATUS";
    2023 => ProbeSlaveHosts, "Error on SHOW SLAVE HOSTS";
    2024 => ProbeSlaveConnect, "Error connecting to slave";
    2025 => ProbeMasterConnect, "Error connecting to master";
    2026 => SslConnectionError, "SSL connection error";
    2027 => MalformedPacket, "Malformed packet";
    2028 => WrongLicense, "This client library is licensed only for use with a different server";
    2029 => NullPointer, "Invalid use of null pointer";
    2030 => NoPrepareStatement, "Statement not prepared";
    2031 => ParamsNotBound, "No data supplied for parameters in prepared statement";
    2032 => DataTruncated, "Data truncated";
    2033 => NoParametersExist, "No parameters exist in the statement";
    2034 => InvalidParameterNumber, "Invalid parameter number";
    2035 => InvalidBufferUse, "Can't send long data for non-string/non-binary data types";
    2036 => UnsupportedParamType, "Using unsupported buffer type";
    2037 => SharedMemoryConnection, "Shared memory connection";
    2038 => SharedMemoryConnectRequestError, "Can't open shared memory; client could not create request event";
    2039 => SharedMemoryConnectAnswerError, "Can't open shared memory; no answer event received from server";
    2040 => SharedMemoryConnectFileMapError, "Can't open shared memory; server could not allocate file mapping";
    2041 => SharedMemoryConnectMapError, "Can't open shared memory; server could not get pointer to file mapping";
    2042 => SharedMemoryFileMapError, "Can't open shared memory; client could not allocate file mapping";
    2043 => SharedMemoryMapError, "Can't open shared memory; client could not get pointer to file mapping";
    2044 => SharedMemoryEventError, "Can't open shared memory; client could not create event";
    2045 => SharedMemoryConnectAbandonedError, "Can't open shared memory; no answer from server";
    2046 => SharedMemoryConnectSetError, "Can't open shared memory; cannot send request event to server";
    2047 => ConnUnknownProtocol, "Wrong or unknown protocol";
    2048 => InvalidConnHandle, "Invalid connection handle";
    2049 => SecureAuth, "Connection using old (pre-4.1.1) authentication protocol refused";
    2050 => FetchCanceled, "Row retrieval was canceled by mysql_stmt_close() call";
    2051 => NoData, "Attempt to read column without prior row fetch";
    2052 => NoStatementMetadata, "Prepared statement contains no metadata";
    2053 => NoResultSet, "Attempt to read a row while there is no result set associated with the statement";
    2054 => NotImplemented, "This feature is not implemented yet";
    2055 => ServerLostExtended, "Lost connection to MySQL server";
    2056 => StatementClosed, "Statement closed indirectly because of a preceding call";
    2057 => NewStatementMetadata, "The number of columns in the result set differs from the number of bound buffers";
    2058 => AlreadyConnected, "This handle is already connected";
    2059 => AuthPluginCannotLoad, "Authentication plugin cannot be loaded";
    2060 => DuplicateConnectionAttr, "There is an attribute with the same name already";
    2061 => AuthPluginError, "Authentication plugin reported an error";
}

impl ErrorCode {
    /// The native numeric value.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Whether the code comes from the client library rather than the server.
    pub fn is_client_side(self) -> bool {
        (2000..3000).contains(&self.code())
    }
}

impl TryFrom<u32> for ErrorCode {
    type Error = u32;

    fn try_from(code: u32) -> std::result::Result<Self, Self::Error> {
        ErrorCode::from_code(code).ok_or(code)
    }
}
